use spindle::sched::{self, CoroutineHandle, State};
use spindle::time::{Timer, sleep};
use spindle::{Error, Promise, Runtime, RuntimeBuilder, all, spawn, spawn_with_stack_size, yield_now};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::thread;
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[spindle::test]
fn spawned_value_is_returned() {
    init_logger();

    assert_eq!(spawn(|| Ok(6 * 7)).wait().unwrap(), 42);
}

#[spindle::test]
fn spawned_error_rejects() {
    let err = spawn(|| Err::<(), _>(Error::msg("nope"))).wait().unwrap_err();

    assert!(matches!(err, Error::Message(ref m) if m == "nope"));
}

#[spindle::test]
fn spawn_only_queues_the_coroutine() {
    let ran = Rc::new(Cell::new(false));

    let flag = ran.clone();
    spawn(move || {
        flag.set(true);
        Ok(())
    });

    assert!(!ran.get());
    assert_eq!(sched::ready_len(), 1);

    yield_now();

    assert!(ran.get());
}

#[spindle::test]
fn ready_coroutines_run_in_fifo_order() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let worker = |name: &'static str| {
        let order = order.clone();
        spawn(move || {
            for step in 0..3 {
                order.borrow_mut().push(format!("{name}{step}"));
                yield_now();
            }
            Ok(())
        })
    };

    let a = worker("a");
    let b = worker("b");

    assert_eq!(all(&[&a, &b]).wait().unwrap(), None);
    assert_eq!(*order.borrow(), ["a0", "b0", "a1", "b1", "a2", "b2"]);
}

#[spindle::test]
fn coroutines_can_spawn_and_wait_on_coroutines() {
    let outer = spawn(|| {
        let inner = spawn(|| Ok(20));
        Ok(inner.wait()? + 1)
    });

    assert_eq!(outer.wait().unwrap(), 21);
}

#[spindle::test]
fn many_small_coroutines() {
    let handles: Vec<Promise<usize>> = (0..500)
        .map(|i| {
            spawn_with_stack_size(64 * 1024, move || {
                yield_now();
                Ok(i)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.wait().unwrap(), i);
    }
}

#[spindle::test]
fn block_until_scheduled() {
    let parked: Rc<RefCell<Option<CoroutineHandle>>> = Rc::new(RefCell::new(None));

    let slot = parked.clone();
    let done = spawn(move || {
        *slot.borrow_mut() = Some(sched::current());
        sched::block();
        Ok("woken")
    });

    yield_now();
    assert_eq!(sched::blocked(), 1);

    let handle = parked.borrow_mut().take().unwrap();
    assert_eq!(handle.state(), State::Blocked);

    sched::schedule(handle);
    assert_eq!(sched::blocked(), 0);
    assert_eq!(sched::ready_len(), 1);

    assert_eq!(done.wait().unwrap(), "woken");
}

#[spindle::test]
fn yield_with_only_blocked_peers_continues_immediately() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let parked: Rc<RefCell<Option<CoroutineHandle>>> = Rc::new(RefCell::new(None));

    let sleeper = {
        let order = order.clone();
        let parked = parked.clone();
        spawn(move || {
            *parked.borrow_mut() = Some(sched::current());
            sched::block();
            order.borrow_mut().push("woken");
            Ok(())
        })
    };

    let yielder = {
        let order = order.clone();
        spawn(move || {
            order.borrow_mut().push("before");
            yield_now();
            order.borrow_mut().push("after");

            if let Some(handle) = parked.borrow_mut().take() {
                sched::schedule(handle);
            }
            Ok(())
        })
    };

    assert_eq!(all(&[&sleeper, &yielder]).wait().unwrap(), None);
    assert_eq!(*order.borrow(), ["before", "after", "woken"]);
}

#[spindle::test]
fn blocked_coroutine_resumes_from_reactor_callback() {
    let still_armed = spawn(|| {
        let me = sched::current();
        let timer = Timer::new();

        let expiry = timer.expire_after(Duration::from_millis(5));
        expiry.then(move |_| sched::schedule(me));

        sched::block();
        Ok(timer.is_armed())
    });

    assert!(!still_armed.wait().unwrap());
}

#[spindle::test]
fn exited_coroutine_is_freed_by_the_next_one_to_run() {
    let seen = Rc::new(Cell::new(None));

    let observed = seen.clone();
    spawn(move || {
        let me: Weak<sched::Coroutine> = Rc::downgrade(&sched::current());

        spawn(move || {
            observed.set(Some(me.strong_count()));
            Ok(())
        });
        Ok(())
    });

    // Blocking hands the thread straight to the first coroutine.
    sleep(Duration::from_millis(20)).wait().unwrap();

    assert_eq!(seen.get(), Some(0));
}

#[spindle::test]
fn exited_coroutine_is_freed_while_the_yielder_is_suspended() {
    let first: Rc<RefCell<Weak<sched::Coroutine>>> = Rc::new(RefCell::new(Weak::new()));
    let seen = Rc::new(Cell::new(None));

    let slot = first.clone();
    spawn(move || {
        *slot.borrow_mut() = Rc::downgrade(&sched::current());
        Ok(())
    });

    let (slot, observed) = (first.clone(), seen.clone());
    spawn(move || {
        observed.set(Some(slot.borrow().strong_count()));
        Ok(())
    });

    // Both run before the yield returns: the second right after the first exits.
    yield_now();

    assert_eq!(seen.get(), Some(0));
}

#[spindle::test]
fn thread_and_coroutines_have_distinct_identities() {
    let main = sched::current();
    assert_eq!(main.state(), State::Running);
    assert_eq!(main.stack_size(), None);

    let main_id = main.id();
    let child_id = spawn(|| Ok(sched::current().id())).wait().unwrap();

    assert_ne!(main_id, child_id);
}

#[spindle::test(stack_size = 131_072)]
fn builder_stack_size_applies_to_spawn() {
    let size = spawn(|| Ok(sched::current().stack_size())).wait().unwrap();

    assert_eq!(size, Some(128 * 1024));
}

#[spindle::test]
fn yield_without_ready_coroutines_returns() {
    yield_now();

    assert_eq!(sched::ready_len(), 0);
}

#[test]
fn block_on_runs_ready_coroutines_before_returning() {
    let runtime = Runtime::new();
    let ran = Rc::new(Cell::new(false));

    let flag = ran.clone();
    runtime.block_on(move || {
        spawn(move || {
            flag.set(true);
            Ok(())
        });
    });

    assert!(ran.get());
}

#[test]
fn runtimes_can_be_recreated_on_the_same_thread() {
    for round in 0..3 {
        let runtime = RuntimeBuilder::new().event_capacity(8).build();
        let value = runtime.block_on(|| spawn(move || Ok(round)).wait());
        assert_eq!(value.unwrap(), round);
    }
}

#[test]
fn each_thread_gets_its_own_runtime() {
    let threads: Vec<_> = (0..4)
        .map(|n| {
            thread::spawn(move || {
                let runtime = Runtime::new();
                runtime.block_on(|| spawn(move || Ok(n * 10)).wait())
            })
        })
        .collect();

    for (n, thread) in threads.into_iter().enumerate() {
        assert_eq!(thread.join().unwrap().unwrap(), n * 10);
    }
}

#[test]
#[should_panic(expected = "a spindle runtime is already running on this thread")]
fn second_runtime_on_a_thread_panics() {
    let _first = Runtime::new();
    let _second = Runtime::new();
}

#[test]
#[should_panic(expected = "no spindle runtime is running on this thread")]
fn spawn_outside_runtime_panics() {
    spawn(|| Ok(()));
}

#[test]
#[should_panic(expected = "stack_size must be at least")]
fn builder_rejects_tiny_stacks() {
    let _ = RuntimeBuilder::new().stack_size(1024);
}

#[test]
#[should_panic(expected = "event_capacity must be > 0")]
fn builder_rejects_zero_event_capacity() {
    let _ = RuntimeBuilder::new().event_capacity(0);
}
