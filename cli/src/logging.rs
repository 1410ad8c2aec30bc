use tracing::{Event, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "warn,fairwheel_shared=info,fairwheel_cli=info";
const VERBOSE_FILTER: &str = "warn,fairwheel_shared=debug,fairwheel_cli=debug";

#[derive(Default)]
struct MessageVisitor {
    message: String,
    // records forwarded from the `log` facade carry their real target here
    log_target: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message.push_str(&format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message.push_str(value),
            "log.target" => self.log_target = Some(value.to_string()),
            _ => {}
        }
    }
}

struct CustomLayer;

impl<S: Subscriber> Layer<S> for CustomLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if visitor.message.is_empty() {
            return;
        }

        let target = visitor.log_target.as_deref().unwrap_or_else(|| metadata.target());
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

        // stdout is reserved for command output
        match *metadata.level() {
            tracing::Level::ERROR => eprintln!("[{}] ❌ Error: {} - {}", timestamp, target, visitor.message),
            tracing::Level::WARN => eprintln!("[{}] ⚠️ Warning: {} - {}", timestamp, target, visitor.message),
            tracing::Level::INFO => eprintln!("[{}] ℹ️ {} - {}", timestamp, target, visitor.message),
            tracing::Level::DEBUG => eprintln!("[{}] 🔄 {} - {}", timestamp, target, visitor.message),
            tracing::Level::TRACE => {}
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn setup(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // also forwards the engine's `log` records
    if let Err(e) = Registry::default().with(env_filter).with(CustomLayer).try_init() {
        eprintln!("Logging already initialised: {}", e);
    }
}
