use spindle::time::sleep;
use spindle::{Error, Promise, spawn, yield_now};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

#[test]
fn observers_run_in_registration_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let promise = Promise::new();

    for i in 0..3 {
        let seen = seen.clone();
        promise.then(move |value: &u32| seen.borrow_mut().push((i, *value)));
    }

    assert!(seen.borrow().is_empty());

    promise.resolve(7);

    assert_eq!(*seen.borrow(), vec![(0, 7), (1, 7), (2, 7)]);
}

#[test]
fn observer_added_after_settling_runs_immediately() {
    let promise = Promise::resolved("ready");
    let seen = Rc::new(Cell::new(false));

    let flag = seen.clone();
    promise.then(move |value| flag.set(*value == "ready"));

    assert!(seen.get());
}

#[test]
fn except_and_finally_follow_rejection() {
    let message = Rc::new(RefCell::new(String::new()));
    let finished = Rc::new(Cell::new(false));
    let resolved = Rc::new(Cell::new(false));

    let promise = Promise::<u32>::new();
    {
        let message = message.clone();
        let finished = finished.clone();
        let resolved = resolved.clone();

        promise
            .then(move |_| resolved.set(true))
            .except(move |err| *message.borrow_mut() = err.to_string())
            .finally(move || finished.set(true));
    }

    promise.reject(Error::msg("boom"));

    assert_eq!(*message.borrow(), "boom");
    assert!(finished.get());
    assert!(!resolved.get());
    assert!(promise.is_settled());
    assert!(promise.is_rejected());
}

#[test]
#[should_panic(expected = "promise settled twice")]
fn settling_twice_panics() {
    let promise = Promise::new();
    promise.resolve(1);
    promise.reject(Error::msg("too late"));
}

#[test]
fn dropping_last_handle_cancels_pending_promise() {
    let cancelled = Rc::new(Cell::new(false));

    {
        let promise = Promise::<u32>::new();
        let flag = cancelled.clone();
        promise.except(move |err| flag.set(err.is_cancelled()));

        let clone = promise.clone();
        drop(promise);
        assert!(!cancelled.get(), "a live clone keeps the promise pending");
        drop(clone);
    }

    assert!(cancelled.get());
}

#[test]
fn settled_promise_can_be_dropped_quietly() {
    let calls = Rc::new(Cell::new(0));

    {
        let promise = Promise::new();
        let calls = calls.clone();
        promise.finally(move || calls.set(calls.get() + 1));
        promise.resolve(());
    }

    assert_eq!(calls.get(), 1);
}

#[test]
fn weak_handle_does_not_keep_promise_alive() {
    let promise = Promise::<u8>::new();
    let weak = promise.downgrade();

    assert!(weak.upgrade().is_some());

    drop(promise);

    assert!(weak.upgrade().is_none());
}

#[test]
fn debug_shows_outcome() {
    assert_eq!(format!("{:?}", Promise::<u32>::new()), "Promise(<pending>)");
    assert_eq!(format!("{:?}", Promise::resolved(3)), "Promise(Ok(3))");
}

#[test]
fn waiting_on_settled_promise_needs_no_runtime() {
    assert_eq!(Promise::resolved(5).wait().unwrap(), 5);
    assert!(Promise::<u8>::rejected(Error::TimedOut)
        .wait()
        .unwrap_err()
        .is_timed_out());
}

#[test]
#[should_panic(expected = "no spindle runtime is running on this thread")]
fn waiting_on_pending_promise_needs_a_runtime() {
    let promise = Promise::<u8>::new();
    let _keep = promise.clone();
    let _ = promise.wait();
}

#[spindle::test]
fn wait_suspends_until_resolved() {
    let promise = Promise::new();
    let producer = promise.clone();

    spawn(move || {
        yield_now();
        producer.resolve(42u32);
        Ok(())
    });

    assert_eq!(promise.wait().unwrap(), 42);
}

#[spindle::test]
fn wait_on_orphaned_promise_is_cancelled() {
    let promise = Promise::<u32>::new();

    assert!(promise.wait().unwrap_err().is_cancelled());
}

#[spindle::test]
fn wait_is_cancelled_when_producer_gives_up() {
    let promise = Promise::<u32>::new();
    let producer = promise.clone();

    spawn(move || {
        sleep(Duration::from_millis(5)).wait()?;
        drop(producer);
        Ok(())
    });

    assert!(promise.wait().unwrap_err().is_cancelled());
}

#[spindle::test]
fn many_waiters_see_the_same_value() {
    let promise = Promise::new();

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let promise = promise.clone();
            spawn(move || promise.wait())
        })
        .collect();

    yield_now();
    promise.resolve(String::from("shared"));

    for waiter in waiters {
        assert_eq!(waiter.wait().unwrap(), "shared");
    }
}

#[spindle::test]
fn every_waiter_is_cancelled_when_the_producer_gives_up() {
    let promise = Promise::<String>::new();

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let promise = promise.clone();
            spawn(move || promise.wait())
        })
        .collect();

    spawn(move || {
        sleep(Duration::from_millis(5)).wait()?;
        drop(promise);
        Ok(())
    });

    for waiter in waiters {
        assert!(waiter.wait().unwrap_err().is_cancelled());
    }
}
