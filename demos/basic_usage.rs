//! Basic usage of the logging facade
//!
//! Run with: cargo run --example basic_usage

use logface::backends::CaptureProvider;
use logface::prelude::*;
use logface::{global, info, warn};
use std::sync::Arc;

fn main() -> logface::Result<()> {
    println!("=== logface basic usage ===\n");

    // Default provider ("console"), memoised by name
    let factory = LogFactory::global();
    let app = factory.get_logger_with_name("app")?;
    app.info("Application started", &[field("pid", std::process::id())]);

    // Derived loggers carry fields without touching the parent
    let request = app.with_fields(vec![field("request_id", "r-42"), field("user", "ann")]);
    request.info("Handling request", &[field("path", "/orders")]);
    info!(request, "status" => 200; "Request finished in {} ms", 17);
    app.info("Parent logger has no request fields", &[]);

    // Level gating
    request.set_level(LogLevel::Warn);
    if request.is_debug_enabled() {
        request.debug(&expensive_dump(), &[]);
    }
    warn!(request, "Slow dependency: {}", "inventory");

    // JSON output through a config value
    let config = LogConfig::new()
        .with_name("json-demo")
        .with_format("json")
        .with_max_message_size(1);
    let json = global::get_logger_with_log_config(&config)?;
    json.info("Structured entry", &[field("items", 3), field("paid", true)]);
    json.info(&"long message ".repeat(200), &[]);

    // Other backends compiled into this build
    for name in factory.provider_names() {
        println!("registered provider: {}", name);
    }
    #[cfg(feature = "tracing-backend")]
    factory
        .create_logger_with_provider("via-tracing", "tracing", &[])?
        .info("Routed through tracing-subscriber", &[field("backend", "tracing")]);

    // Custom provider registered at runtime
    let capture = CaptureProvider::new();
    factory.register_provider("memory", Arc::new(capture.clone()));
    let audit = factory.create_logger_with_provider("audit", "memory", &[])?;
    audit.warn("Permission changed", &[field("role", "admin")]);
    println!("captured entries: {:?}", capture.store().messages());
    factory.unregister_provider("memory");

    // Package-level shortcuts follow the swappable global logger
    global::info("Via the global logger", &[]);
    set_global_logger(audit);
    global::infof(format_args!("Now captured too: {}", capture.store().len()));
    println!("captured after swap: {}", capture.store().len());

    app.sync()?;
    println!("\n=== done ===");
    Ok(())
}

fn expensive_dump() -> String {
    (0..1000).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}
