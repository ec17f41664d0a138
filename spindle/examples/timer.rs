//! Example: timers, timeouts and combinators

use spindle::time::{Timer, sleep, timeout};
use std::time::{Duration, Instant};

#[spindle::main]
fn main() -> spindle::Result<()> {
    let start = Instant::now();

    // Three coroutines sleeping concurrently finish in ~300ms, not 600ms
    let naps: Vec<_> = [100u64, 200, 300]
        .into_iter()
        .map(|ms| {
            spindle::spawn(move || {
                sleep(Duration::from_millis(ms)).wait()?;
                println!("woke after {ms}ms");
                Ok(ms)
            })
        })
        .collect();

    let inputs: Vec<&dyn spindle::Observable> = naps.iter().map(|p| p as &dyn spindle::Observable).collect();
    spindle::all(&inputs).wait()?;
    println!("all naps done in {:?}", start.elapsed());

    // Whichever settles first wins
    let winner = spindle::race!(
        sleep(Duration::from_millis(50)),
        sleep(Duration::from_millis(10))
    )
    .wait()?;
    println!("race won by input {}", winner.index);

    // Bound a slow operation
    match timeout(Duration::from_millis(20), sleep(Duration::from_secs(1))).wait() {
        Ok(()) => println!("finished in time"),
        Err(err) => println!("gave up: {err}"),
    }

    // Re-arming a timer cancels the previous expiry
    let timer = Timer::new();
    let first = timer.expire_after(Duration::from_secs(10));
    let second = timer.expire_after(Duration::from_millis(10));
    println!("first expiry: {:?}", first.wait());
    second.wait()?;

    Ok(())
}
