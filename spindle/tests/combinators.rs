use spindle::time::sleep;
use spindle::{Error, Promise, all, all_settled, any, race, spawn};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[spindle::test]
fn all_resolves_once_every_input_resolved() {
    let number = spawn(|| Ok(1));
    let delay = sleep(Duration::from_millis(5));
    let ready = Promise::resolved("ready");

    assert_eq!(all(&[&number, &delay, &ready]).wait().unwrap(), None);
    assert!(number.is_settled() && delay.is_settled());
}

#[spindle::test]
fn all_reports_first_rejection() {
    let slow = spawn(|| {
        sleep(Duration::from_millis(20)).wait()?;
        Ok(())
    });
    let failing = spawn(|| Err::<(), _>(Error::msg("boom")));

    assert_eq!(all(&[&slow, &failing]).wait().unwrap(), Some(1));
    assert!(!slow.is_settled());

    slow.wait().unwrap();
}

#[test]
fn all_ignores_rejections_after_the_first() {
    let first = Promise::<u8>::new();
    let second = Promise::<u8>::new();
    let result = all(&[&first, &second]);

    second.reject(Error::msg("second"));
    first.reject(Error::msg("first"));

    assert_eq!(result.wait().unwrap(), Some(1));
}

#[test]
fn empty_all_and_any_resolve_immediately() {
    assert_eq!(all(&[]).wait().unwrap(), None);
    assert_eq!(any(&[]).wait().unwrap(), None);
    all_settled(&[]).wait().unwrap();
}

#[spindle::test]
fn any_resolves_with_first_success() {
    let rejected = Promise::<u8>::rejected(Error::TimedOut);
    let later = spawn(|| {
        sleep(Duration::from_millis(5)).wait()?;
        Ok("late")
    });

    assert_eq!(any(&[&rejected, &later]).wait().unwrap(), Some(1));
}

#[spindle::test]
fn any_is_none_when_everything_rejects() {
    let first = spawn(|| Err::<(), _>(Error::msg("a")));
    let second = spawn(|| Err::<u32, _>(Error::msg("b")));

    assert_eq!(any(&[&first, &second]).wait().unwrap(), None);
}

#[spindle::test]
fn race_picks_the_first_to_settle() {
    let slow = sleep(Duration::from_millis(50));
    let fast = sleep(Duration::from_millis(5));

    let winner = race(&[&slow, &fast]).wait().unwrap();

    assert_eq!(winner.index, 1);
    assert!(winner.outcome.is_ok());
    assert!(!slow.is_settled());
}

#[test]
fn race_reports_a_rejected_winner() {
    let failed = Promise::<u32>::rejected(Error::TimedOut);
    let pending = Promise::<()>::new();

    let winner = race(&[&failed, &pending]).wait().unwrap();

    assert_eq!(winner.index, 0);
    assert!(winner.outcome.unwrap_err().is_timed_out());
}

#[test]
fn empty_race_is_cancelled_when_dropped() {
    let cancelled = Rc::new(Cell::new(false));

    {
        let result = race(&[]);
        assert!(!result.is_settled());

        let flag = cancelled.clone();
        result.except(move |err| flag.set(err.is_cancelled()));
    }

    assert!(cancelled.get());
}

#[spindle::test]
fn all_settled_waits_for_failures_too() {
    let failing = spawn(|| Err::<(), _>(Error::msg("nope")));
    let sleeping = sleep(Duration::from_millis(5));

    all_settled(&[&failing, &sleeping]).wait().unwrap();

    assert!(failing.is_rejected());
    assert!(sleeping.is_settled() && !sleeping.is_rejected());
}

#[spindle::test]
fn macros_accept_mixed_promise_types() {
    let failed = spindle::all!(
        spawn(|| Ok(1)),
        sleep(Duration::from_millis(1)),
        Promise::resolved("x")
    )
    .wait()
    .unwrap();
    assert_eq!(failed, None);

    let first = spindle::any!(
        Promise::<u8>::rejected(Error::Cancelled),
        spawn(|| Ok("ok"))
    )
    .wait()
    .unwrap();
    assert_eq!(first, Some(1));

    let winner = spindle::race!(
        sleep(Duration::from_millis(30)),
        sleep(Duration::from_millis(1))
    )
    .wait()
    .unwrap();
    assert_eq!(winner.index, 1);

    spindle::all_settled!(spawn(|| Err::<(), _>(Error::msg("ignored"))))
        .wait()
        .unwrap();
}
