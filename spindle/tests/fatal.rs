//! Fatal runtime errors abort the process, so each scenario runs in a child
//! copy of this test binary and the parent checks how it died.

use spindle::{Promise, Runtime, sched, spawn, yield_now};
use std::env;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Stdio};

const CHILD_ENV: &str = "SPINDLE_FATAL_SCENARIO";

/// Runs `scenario` in a child process when invoked as one; otherwise spawns
/// the child and asserts that it aborted.
fn expect_abort(name: &str, scenario: fn()) {
    if env::var(CHILD_ENV).as_deref() == Ok(name) {
        scenario();
        return;
    }

    let exe = env::current_exe().unwrap();
    let status = Command::new(exe)
        .args([name, "--exact", "--test-threads=1"])
        .env(CHILD_ENV, name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();

    assert_eq!(
        status.signal(),
        Some(libc::SIGABRT),
        "scenario `{name}` should abort, got {status}"
    );
}

#[test]
fn panic_in_spawned_coroutine_aborts() {
    expect_abort("panic_in_spawned_coroutine_aborts", || {
        let runtime = Runtime::new();
        runtime.block_on(|| {
            let _ = spawn::<_, ()>(|| panic!("boom")).wait();
        });
    });
}

#[test]
fn settling_twice_inside_a_coroutine_aborts() {
    expect_abort("settling_twice_inside_a_coroutine_aborts", || {
        let runtime = Runtime::new();
        runtime.block_on(|| {
            let promise = Promise::new();
            let producer = promise.clone();

            let _ = spawn(move || {
                producer.resolve(1);
                producer.resolve(2);
                Ok(())
            })
            .wait();
        });
    });
}

#[test]
fn dropping_runtime_with_blocked_coroutine_aborts() {
    expect_abort("dropping_runtime_with_blocked_coroutine_aborts", || {
        let runtime = Runtime::new();
        runtime.block_on(|| {
            spawn(|| {
                sched::block();
                Ok(())
            });
            yield_now();
        });
        drop(runtime);
    });
}

#[test]
fn waiting_with_nothing_left_to_run_aborts() {
    expect_abort("waiting_with_nothing_left_to_run_aborts", || {
        let runtime = Runtime::new();
        runtime.block_on(|| {
            let promise = Promise::<()>::new();
            let _keep = promise.clone();
            let _ = promise.wait();
        });
    });
}
