//! Stress tests for the provider registry and shared loggers
//!
//! These tests verify:
//! - Concurrent registration, lookup and emission never corrupt the registry
//! - The final provider set is exact regardless of interleaving
//! - Memoised loggers are shared, not rebuilt, under contention
//! - One sink shared by many derived loggers keeps every line intact

use logface::backends::{CaptureProvider, ConsoleLogger};
use logface::core::{
    field, LogFactory, LogLevel, Logger, LoggerOption, LoggerOptions, LoggerProvider, LoggerRef,
    Result,
};
use logface::sink::SharedSink;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const ITERATIONS: usize = 200;

#[test]
fn test_concurrent_register_get_emit() {
    let factory = Arc::new(LogFactory::empty());
    let provider = CaptureProvider::new();
    factory.register_provider("shared", Arc::new(provider.clone()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let factory = Arc::clone(&factory);
            let provider = provider.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..ITERATIONS {
                    let own = format!("p{}-{}", t, i % 5);
                    factory.register_provider(own.clone(), Arc::new(provider.clone()));

                    let logger = factory
                        .get_logger_with_provider(&format!("svc{}", i % 3), "shared")
                        .expect("shared provider is never removed");
                    logger.info("tick", &[field("thread", t), field("i", i)]);

                    // Odd slots are transient
                    if i % 5 % 2 == 1 {
                        factory.unregister_provider(&own);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let mut expected: BTreeSet<String> = (0..THREADS)
        .flat_map(|t| [0, 2, 4].map(|slot| format!("p{}-{}", t, slot)))
        .collect();
    expected.insert("shared".to_string());
    let actual: BTreeSet<String> = factory.provider_names().into_iter().collect();
    assert_eq!(actual, expected);

    assert_eq!(provider.store().len(), THREADS * ITERATIONS);
    assert_eq!(factory.cached_logger_count(), 3);
}

#[test]
fn test_memoised_logger_is_shared() {
    struct Counting {
        inner: CaptureProvider,
        builds: AtomicUsize,
    }

    impl LoggerProvider for Counting {
        fn create(&self, name: &str, options: &[LoggerOption]) -> Result<LoggerRef> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            self.inner.create(name, options)
        }
    }

    let factory = Arc::new(LogFactory::empty());
    let counting = Arc::new(Counting {
        inner: CaptureProvider::new(),
        builds: AtomicUsize::new(0),
    });
    factory.register_provider("counting", counting.clone());
    factory.set_default_provider("counting").unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                factory.get_logger_with_name("db").unwrap()
            })
        })
        .collect();
    let loggers: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect();

    // Racing first calls may build more than once, but only one instance is kept
    assert!(counting.builds.load(Ordering::SeqCst) >= 1);
    let cached = factory.cached_logger("db", "counting").unwrap();
    let winners = loggers.iter().filter(|l| Arc::ptr_eq(l, &cached)).count();
    assert!(winners >= 1);
    assert!(Arc::ptr_eq(&factory.get_logger_with_name("db").unwrap(), &cached));
}

#[test]
fn test_shared_sink_lines_stay_whole() {
    let sink = SharedSink::memory();
    let base = Arc::new(ConsoleLogger::with_sink(
        "stress",
        &LoggerOptions::default(),
        sink.clone(),
    ));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let base = Arc::clone(&base);
            thread::spawn(move || {
                let derived = base.with_field("worker", t.into());
                for i in 0..ITERATIONS {
                    derived.info("line", &[field("seq", i)]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let contents = sink.contents();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), THREADS * ITERATIONS);
    assert!(lines
        .iter()
        .all(|line| line.contains("[INFO] [stress] line worker=") && line.contains(" seq=")));
}

#[test]
fn test_level_changes_race_with_emission() {
    let provider = CaptureProvider::new();
    let logger = provider.create("racy", &[]).unwrap();
    let stop = Arc::new(AtomicUsize::new(0));

    let toggler = {
        let logger = Arc::clone(&logger);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while stop.load(Ordering::Relaxed) == 0 {
                logger.set_level(LogLevel::Error);
                logger.set_level(LogLevel::Debug);
            }
        })
    };

    for i in 0..ITERATIONS * 10 {
        logger.info("maybe", &[field("i", i)]);
        logger.error("always", &[]);
    }
    stop.store(1, Ordering::Relaxed);
    toggler.join().expect("toggler panicked");

    let messages = provider.store().messages();
    let always = messages.iter().filter(|m| *m == "always").count();
    assert_eq!(always, ITERATIONS * 10);
    assert!(messages.len() >= always);
}
