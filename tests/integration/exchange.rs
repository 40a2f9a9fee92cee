//! End-to-end exchanges across the namespace pair: fssd serving in
//! fss-b, fss-ctl sending from fss-a.

use crate::*;

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Per-run config path, so tests never pick up a developer's real
/// ~/.config/fss/config.toml.
fn test_config_path() -> String {
    format!("/tmp/fss-itest-{}.toml", std::process::id())
}

/// Spawn fssd in the responder namespace. Extra env pairs let a test
/// override config knobs (FSS_SEARCH__PHRASE and friends).
fn spawn_responder(bin: &Path, env: &[(&str, &str)]) -> Child {
    let mut cmd = Command::new("ip");
    cmd.args(["netns", "exec", NS_B]);
    cmd.arg(bin);
    cmd.arg(VETH_B);
    cmd.env("FSS_CONFIG", test_config_path());
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());
    let child = cmd.spawn().expect("failed to spawn fssd");

    // No readiness endpoint to poll; give the socket bind a moment.
    thread::sleep(Duration::from_millis(500));
    child
}

/// Run fss-ctl in the client namespace, one-shot send.
fn ctl_send(bin: &Path, peer: &str, timeout_ms: u64, args: &[&str], sentence: &str) -> Output {
    let mut cmd = Command::new("ip");
    cmd.args(["netns", "exec", NS_A]);
    cmd.arg(bin);
    cmd.args(["--iface", VETH_A, "--peer", peer]);
    cmd.args(["--timeout-ms", &timeout_ms.to_string()]);
    cmd.args(args);
    cmd.args(["send", sentence]);
    cmd.env("FSS_CONFIG", test_config_path());
    cmd.output().expect("failed to run fss-ctl")
}

/// Kill any fssd left over from a previous (possibly panicked) run.
fn cleanup_fssd() {
    let _ = Command::new("pkill").args(["-x", "fssd"]).output();
}

/// Both binaries, or skip: the workspace must be built before the
/// integration tests run.
fn bins_or_skip() -> Option<(PathBuf, PathBuf)> {
    match (workspace_bin("fssd"), workspace_bin("fss-ctl")) {
        (Some(fssd), Some(ctl)) => Some((fssd, ctl)),
        _ => {
            eprintln!("SKIP: binaries not built — run cargo build --workspace first");
            None
        }
    }
}

/// The reference scenario: "the word is word" holds two occurrences,
/// the first at byte 4.
#[test]
fn test_end_to_end_word_search() {
    if !netns_available() {
        eprintln!("SKIP: netns not available");
        return;
    }
    let Some((fssd_bin, ctl_bin)) = bins_or_skip() else {
        return;
    };

    let _lock = DAEMON_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_fssd();

    let peer = mac_of(NS_B, VETH_B).expect("responder MAC");
    let mut daemon = spawn_responder(&fssd_bin, &[]);

    let result = (|| -> Result<()> {
        let out = ctl_send(&ctl_bin, &peer, 3000, &[], "the word is word");
        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);

        if !out.status.success() {
            bail!("client failed\nstdout: {stdout}\nstderr: {stderr}");
        }
        if !stdout.contains("found 2 time(s)") {
            bail!("wrong count: {stdout}");
        }
        if !stdout.contains("at byte 4") {
            bail!("wrong offset: {stdout}");
        }
        if !stdout.contains("\"word\"") {
            bail!("matched substring missing: {stdout}");
        }
        println!("{stdout}");
        Ok(())
    })();

    daemon.kill().ok();
    daemon.wait().ok();
    cleanup_fssd();
    result.unwrap();
}

/// A sentence without the phrase comes back count 0 and no offset line.
#[test]
fn test_end_to_end_phrase_absent() {
    if !netns_available() {
        eprintln!("SKIP: netns not available");
        return;
    }
    let Some((fssd_bin, ctl_bin)) = bins_or_skip() else {
        return;
    };

    let _lock = DAEMON_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_fssd();

    let peer = mac_of(NS_B, VETH_B).expect("responder MAC");
    let mut daemon = spawn_responder(&fssd_bin, &[]);

    let result = (|| -> Result<()> {
        let out = ctl_send(&ctl_bin, &peer, 3000, &[], "nothing to see here");
        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);

        if !out.status.success() {
            bail!("client failed\nstdout: {stdout}\nstderr: {stderr}");
        }
        if !stdout.contains("found 0 time(s)") {
            bail!("expected zero count: {stdout}");
        }
        if stdout.contains("at byte") {
            bail!("offset printed for a miss: {stdout}");
        }
        Ok(())
    })();

    daemon.kill().ok();
    daemon.wait().ok();
    cleanup_fssd();
    result.unwrap();
}

/// Oversize input is truncated client-side, searched as 256 bytes by a
/// responder configured (via env override) for a phrase it will hit.
#[test]
fn test_end_to_end_truncation() {
    if !netns_available() {
        eprintln!("SKIP: netns not available");
        return;
    }
    let Some((fssd_bin, ctl_bin)) = bins_or_skip() else {
        return;
    };

    let _lock = DAEMON_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_fssd();

    let peer = mac_of(NS_B, VETH_B).expect("responder MAC");
    let mut daemon = spawn_responder(&fssd_bin, &[("FSS_SEARCH__PHRASE", "aa")]);

    let result = (|| -> Result<()> {
        let long = "a".repeat(300);
        let out = ctl_send(&ctl_bin, &peer, 3000, &["--phrase", "aa"], &long);
        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);

        if !out.status.success() {
            bail!("client failed\nstdout: {stdout}\nstderr: {stderr}");
        }
        if !stdout.contains("truncating to 256") {
            bail!("truncation warning missing: {stdout}");
        }
        // 256 a's hold 128 non-overlapping "aa"
        if !stdout.contains("found 128 time(s)") {
            bail!("wrong count after truncation: {stdout}");
        }
        if !stdout.contains("at byte 0") {
            bail!("wrong first offset: {stdout}");
        }
        Ok(())
    })();

    daemon.kill().ok();
    daemon.wait().ok();
    cleanup_fssd();
    result.unwrap();
}

/// With nobody answering, the client must report no response within the
/// deadline and exit nonzero — and must not block past it.
#[test]
fn test_no_responder_times_out() {
    if !netns_available() {
        eprintln!("SKIP: netns not available");
        return;
    }
    let Some((_fssd_bin, ctl_bin)) = bins_or_skip() else {
        return;
    };

    let _lock = DAEMON_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_fssd();

    let peer = mac_of(NS_B, VETH_B).expect("responder MAC");

    let started = Instant::now();
    let out = ctl_send(&ctl_bin, &peer, 500, &[], "is anyone there");
    let elapsed = started.elapsed();
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert!(!out.status.success(), "client should exit nonzero on timeout");
    assert!(
        stderr.contains("no response"),
        "timeout not reported: {stderr}"
    );
    // 500ms deadline; the rest is process startup slack.
    assert!(
        elapsed < Duration::from_secs(5),
        "client blocked for {elapsed:?}"
    );
}

/// A config file that exists but does not parse must be reported, not
/// silently swapped for defaults. Needs no namespaces: with nothing
/// configured the send fails before any socket work.
#[test]
fn test_unparseable_config_is_reported() {
    let Some(ctl_bin) = workspace_bin("fss-ctl") else {
        eprintln!("SKIP: binaries not built — run cargo build --workspace first");
        return;
    };

    let path = format!("/tmp/fss-itest-bad-{}.toml", std::process::id());
    std::fs::write(&path, "[link\ninterface =").expect("write bad config");

    let out = Command::new(&ctl_bin)
        .args(["send", "hello"])
        .env("FSS_CONFIG", &path)
        .env_remove("FSS_LINK__INTERFACE")
        .output()
        .expect("failed to run fss-ctl");
    let _ = std::fs::remove_file(&path);

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!out.status.success(), "nothing is configured; send must fail");
    assert!(
        stderr.contains("failed to load config"),
        "parse error not surfaced: {stderr}"
    );
    assert!(
        stderr.contains("no interface"),
        "defaults not applied after the warning: {stderr}"
    );
}
