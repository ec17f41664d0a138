use spindle::time::{SystemTimer, Timer, sleep, sleep_until, timeout};
use spindle::{Error, Promise, all, spawn};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime};

#[spindle::test]
fn sleep_waits_at_least_the_duration() {
    let start = Instant::now();
    sleep(Duration::from_millis(50)).wait().unwrap();

    assert!(
        start.elapsed() >= Duration::from_millis(50),
        "sleep should wait at least the specified duration"
    );
}

#[spindle::test]
fn zero_sleep_is_fast_but_not_synchronous() {
    let start = Instant::now();
    let nap = sleep(Duration::ZERO);

    assert!(!nap.is_settled());
    nap.wait().unwrap();

    assert!(start.elapsed() < Duration::from_millis(50));
}

#[spindle::test]
fn sleep_until_past_deadline_resolves() {
    let deadline = Instant::now();
    sleep(Duration::from_millis(2)).wait().unwrap();

    sleep_until(deadline).wait().unwrap();
}

#[spindle::test]
fn sleepers_wake_in_deadline_order() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let sleeper = |ms: u64| {
        let order = order.clone();
        spawn(move || {
            sleep(Duration::from_millis(ms)).wait()?;
            order.borrow_mut().push(ms);
            Ok(())
        })
    };

    let slow = sleeper(30);
    let fast = sleeper(10);
    let medium = sleeper(20);

    assert_eq!(all(&[&slow, &fast, &medium]).wait().unwrap(), None);
    assert_eq!(*order.borrow(), [10, 20, 30]);
}

#[spindle::test]
fn timer_expires() {
    let timer = Timer::new();
    assert!(!timer.is_armed());

    let expiry = timer.expire_after(Duration::from_millis(10));
    assert!(timer.is_armed());

    expiry.wait().unwrap();
    assert!(!timer.is_armed());
}

#[spindle::test]
fn rearming_cancels_the_previous_expiry() {
    let timer = Timer::new();

    let first = timer.expire_after(Duration::from_secs(5));
    let second = timer.expire_at(Instant::now() + Duration::from_millis(5));

    assert!(first.wait().unwrap_err().is_cancelled());
    second.wait().unwrap();
}

#[spindle::test]
fn cancel_rejects_pending_expiry() {
    let timer = Timer::new();
    let expiry = timer.expire_after(Duration::from_secs(5));

    timer.cancel();

    assert!(!timer.is_armed());
    assert!(expiry.wait().unwrap_err().is_cancelled());

    // Cancelling again is a no-op.
    timer.cancel();
}

#[spindle::test]
fn dropping_timer_cancels_expiry() {
    let expiry = {
        let timer = Timer::new();
        timer.expire_after(Duration::from_secs(5))
    };

    assert!(expiry.wait().unwrap_err().is_cancelled());
}

#[spindle::test]
fn timeout_passes_through_early_result() {
    let work = spawn(|| {
        sleep(Duration::from_millis(5)).wait()?;
        Ok(123)
    });

    assert_eq!(timeout(Duration::from_millis(200), work).wait().unwrap(), 123);
}

#[spindle::test]
fn timeout_expires() {
    let start = Instant::now();
    let err = timeout(Duration::from_millis(10), sleep(Duration::from_secs(5)))
        .wait()
        .unwrap_err();

    assert!(err.is_timed_out());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[spindle::test]
fn timing_out_leaves_the_work_running() {
    let slow = spawn(|| {
        sleep(Duration::from_millis(40)).wait()?;
        Ok("finished")
    });

    let err = timeout(Duration::from_millis(5), slow.clone())
        .wait()
        .unwrap_err();
    assert!(err.is_timed_out());

    assert_eq!(slow.wait().unwrap(), "finished");
}

#[spindle::test]
fn timeout_forwards_rejection() {
    let failing = spawn(|| Err::<u8, _>(Error::msg("bad input")));

    let err = timeout(Duration::from_secs(5), failing).wait().unwrap_err();

    assert_eq!(err.to_string(), "bad input");
}

#[spindle::test]
fn timeout_of_settled_promise_settles_immediately() {
    let bounded = timeout(Duration::from_millis(1), Promise::resolved(5));

    assert!(bounded.is_settled());
    assert_eq!(bounded.wait().unwrap(), 5);
}

#[spindle::test]
fn system_timer_expires_at_wall_clock_deadline() {
    let timer = SystemTimer::new();
    let start = Instant::now();

    let expiry = timer.expire_at(SystemTime::now() + Duration::from_millis(20));
    assert!(timer.is_armed());

    expiry.wait().unwrap();
    assert!(start.elapsed() >= Duration::from_millis(19));
    assert!(!timer.is_armed());
}

#[spindle::test]
fn system_timer_past_deadline_expires_promptly() {
    let timer = SystemTimer::new();
    let past = SystemTime::now() - Duration::from_secs(3600);

    timer.expire_at(past).wait().unwrap();
}

#[spindle::test]
fn system_timer_rearm_and_cancel() {
    let timer = SystemTimer::new();

    let first = timer.expire_after(Duration::from_secs(5));
    let second = timer.expire_after(Duration::from_secs(5));
    assert!(first.wait().unwrap_err().is_cancelled());

    timer.cancel();
    assert!(second.wait().unwrap_err().is_cancelled());
    assert!(!timer.is_armed());
}
