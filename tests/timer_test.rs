/*!
 * Timer Service Tests
 * Firing, completion waits, cancellation races and hook serialization
 */

use netstack_core::{NetTimer, StackError, TimerService, TimerServiceConfig};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn service(name: &str) -> TimerService {
    TimerService::with_config(TimerServiceConfig::new().with_thread_name(name)).unwrap()
}

#[test]
fn test_wait_returns_after_hook_returns() {
    let timers = service("timer test wait");
    let started = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));

    let timer = {
        let started = started.clone();
        let finished = finished.clone();
        NetTimer::new("slow", move |_, _| {
            started.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            finished.store(true, Ordering::SeqCst);
        })
    };

    timers.schedule(&timer, Some(Duration::ZERO));
    while !started.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(timers.is_running(&timer));

    timers.wait_for_completion(&timer).unwrap();
    assert!(finished.load(Ordering::SeqCst));
    assert!(!timers.is_running(&timer));
}

#[test]
fn test_timers_fire_in_due_order() {
    let timers = service("timer test order");
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let make = |label: &'static str| {
        let order = order.clone();
        NetTimer::new(label, move |_, _| order.lock().push(label))
    };
    let late = make("late");
    let early = make("early");

    timers.schedule(&late, Some(Duration::from_millis(80)));
    timers.schedule(&early, Some(Duration::from_millis(20)));
    timers.wait_for_completion(&late).unwrap();
    timers.wait_for_completion(&early).unwrap();

    assert_eq!(*order.lock(), vec!["early", "late"]);
}

#[test]
fn test_hooks_never_overlap() {
    let timers = service("timer test serial");
    let running = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let fired = Arc::new(AtomicUsize::new(0));

    let batch: Vec<_> = (0..16)
        .map(|_| {
            let running = running.clone();
            let overlaps = overlaps.clone();
            let fired = fired.clone();
            NetTimer::new("serial", move |_, _| {
                if running.fetch_add(1, Ordering::SeqCst) != 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                thread::sleep(Duration::from_millis(2));
                running.fetch_sub(1, Ordering::SeqCst);
                fired.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for timer in &batch {
        timers.schedule(timer, Some(Duration::from_millis(5)));
    }
    for timer in &batch {
        timers.wait_for_completion(timer).unwrap();
    }

    assert_eq!(fired.load(Ordering::SeqCst), 16);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancel_race_never_deadlocks() {
    const ROUNDS: u64 = 2000;

    let timers = service("timer test race");
    let fired = Arc::new(AtomicUsize::new(0));
    let timer = {
        let fired = fired.clone();
        NetTimer::new("race", move |_, _| {
            fired.fetch_add(1, Ordering::SeqCst);
        })
    };

    let stop = Arc::new(AtomicBool::new(false));
    let canceller = {
        let handle = timers.handle();
        let timer = timer.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let mut cancelled = 0usize;
            while !stop.load(Ordering::SeqCst) {
                if handle.cancel(&timer) {
                    cancelled += 1;
                }
                thread::yield_now();
            }
            cancelled
        })
    };

    let start = Instant::now();
    for round in 0..ROUNDS {
        timers.schedule(&timer, Some(Duration::from_micros(round % 50)));
        timers.cancel(&timer);
        timers.wait_for_completion(&timer).unwrap();

        assert!(!timer.is_active());
        assert!(!timers.is_running(&timer));
    }

    stop.store(true, Ordering::SeqCst);
    canceller.join().unwrap();

    assert!(fired.load(Ordering::SeqCst) as u64 <= ROUNDS);
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[test]
fn test_schedule_races_remote_cancel() {
    let timers = service("timer test remote cancel");
    let timer = NetTimer::new("remote", |_, _| {});

    for _ in 0..500 {
        timers.schedule(&timer, Some(Duration::from_micros(20)));
        let remote = {
            let handle = timers.handle();
            let timer = timer.clone();
            thread::spawn(move || handle.cancel(&timer))
        };
        remote.join().unwrap();
        timers.wait_for_completion(&timer).unwrap();

        assert!(!timer.is_active());
        assert!(!timers.is_running(&timer));
    }
}

#[test]
fn test_cancel_from_other_thread_while_hook_runs() {
    let timers = service("timer test cancel running");
    let release = Arc::new(AtomicBool::new(false));
    let timer = {
        let release = release.clone();
        NetTimer::new("blocked", move |_, _| {
            while !release.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    timers.schedule(&timer, Some(Duration::ZERO));
    while !timers.is_running(&timer) {
        thread::sleep(Duration::from_millis(1));
    }

    // Already out of the scheduled set
    assert!(!timers.cancel(&timer));

    let waiter = {
        let handle = timers.handle();
        let timer = timer.clone();
        thread::spawn(move || handle.wait_for_completion(&timer))
    };
    thread::sleep(Duration::from_millis(20));
    assert!(!waiter.is_finished());

    release.store(true, Ordering::SeqCst);
    waiter.join().unwrap().unwrap();
}

#[test]
fn test_hook_reschedules_itself() {
    let timers = service("timer test periodic");
    let ticks = Arc::new(AtomicUsize::new(0));

    let timer = {
        let ticks = ticks.clone();
        NetTimer::new("periodic", move |handle, timer| {
            if ticks.fetch_add(1, Ordering::SeqCst) + 1 < 5 {
                handle.schedule(timer, Some(Duration::from_millis(1)));
            }
        })
    };

    timers.schedule(&timer, Some(Duration::ZERO));
    while ticks.load(Ordering::SeqCst) < 5 {
        thread::sleep(Duration::from_millis(2));
    }
    timers.wait_for_completion(&timer).unwrap();

    assert_eq!(ticks.load(Ordering::SeqCst), 5);
    assert!(!timer.is_active());
}

#[test]
fn test_init_refused_while_scheduled() {
    let timers = service("timer test init");
    let timer = NetTimer::new("first", |_, _| {});

    timers.schedule(&timer, Some(Duration::from_secs(30)));
    assert!(matches!(
        timer.init(|_, _| {}),
        Err(StackError::InvalidOperation(_))
    ));

    timers.cancel(&timer);
    timer.init(|_, _| {}).unwrap();
    assert!(!timer.is_active());
}

#[test]
fn test_dump_lists_scheduled_timers() {
    let timers = service("timer test dump");
    let a = NetTimer::new("retransmit", |_, _| {});
    let b = NetTimer::new("keepalive", |_, _| {});

    timers.schedule(&a, Some(Duration::from_secs(30)));
    timers.schedule(&b, Some(Duration::from_secs(60)));

    let dump = timers.dump_timers();
    let mut labels: Vec<_> = dump.timers.iter().map(|t| t.label.as_str()).collect();
    labels.sort_unstable();
    assert_eq!(labels, vec!["keepalive", "retransmit"]);
    assert!(dump
        .timers
        .iter()
        .all(|t| t.due_in.is_some_and(|d| d <= Duration::from_secs(60))));

    let rendered = dump.to_string();
    assert!(rendered.contains(&a.id().to_string()));

    timers.cancel(&a);
    timers.cancel(&b);
    assert!(timers.dump_timers().timers.is_empty());
}

#[test]
fn test_shutdown_unschedules_pending() {
    let timers = service("timer test shutdown");
    let handle = timers.handle();
    let timer = NetTimer::new("pending", |_, _| {});

    timers.schedule(&timer, Some(Duration::from_secs(60)));
    timers.shutdown();

    assert!(!timer.is_active());
    handle.wait_for_completion(&timer).unwrap();

    // Late schedules through a surviving handle are dropped
    handle.schedule(&timer, Some(Duration::ZERO));
    assert!(!timer.is_active());
    handle.wait_for_completion(&timer).unwrap();
}
