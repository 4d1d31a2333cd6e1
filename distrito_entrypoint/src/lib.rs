#![deny(missing_docs)]
//! Process initialization shared by the Distrito 0 binaries: `.env` loading, the
//! panic hook and the tracing subscriber for the current [Environment].

mod environment;

pub use environment::{ENVIRONMENT_VAR, Environment, EnvironmentErr, UnknownValue};

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};
use tracing_tree::HierarchicalLayer;

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Name of the variable holding the indentation for hierarchical local output
pub const TREE_INDENT_VAR: &str = "TRACING_TREE_INDENT";

/// Indentation requested through [TREE_INDENT_VAR], if any
pub fn tree_indent_from_env() -> Option<usize> {
    parse_tree_indent(std::env::var(TREE_INDENT_VAR).ok().as_deref())
}

fn parse_tree_indent(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse().ok().filter(|indent| *indent > 0)
}

/// Describes how the process should be initialized
#[derive(Debug)]
pub struct Entrypoint {
    env: Environment,
    /// indentation for hierarchical output, only honoured in [Environment::Local]
    tree_tracing: Option<usize>,
}

impl Default for Entrypoint {
    fn default() -> Self {
        Self::new(Environment::new_or_prod())
    }
}

/// proof that [Entrypoint::init] ran
#[derive(Debug)]
pub struct InitializedEntrypoint {
    env: Environment,
}

impl InitializedEntrypoint {
    /// the environment the process was initialized for
    pub fn environment(&self) -> Environment {
        self.env
    }
}

impl Entrypoint {
    /// create an [Entrypoint] for a known [Environment]
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            tree_tracing: None,
        }
    }

    /// use hierarchical span output with the given indentation when running locally
    pub fn tree_tracing(mut self, indent: Option<usize>) -> Self {
        self.tree_tracing = indent;
        self
    }

    /// consume self and install the global subscriber and panic hook
    pub fn init(self) -> InitializedEntrypoint {
        dotenv::dotenv().ok();
        std::panic::set_hook(Box::new(tracing_panic::panic_hook));

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        match (self.env, self.tree_tracing) {
            (Environment::Local, None) => {
                tracing_subscriber::fmt()
                    .with_ansi(true)
                    .with_env_filter(filter)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty()
                    .init();
            }
            (Environment::Local, Some(indent)) => {
                let subscriber = Registry::default()
                    .with(filter)
                    .with(HierarchicalLayer::new(indent));
                if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                    eprintln!("tracing subscriber already installed: {e}");
                }
            }
            (Environment::Production | Environment::Develop, _) => {
                tracing_subscriber::fmt()
                    .with_ansi(false)
                    .with_env_filter(filter)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .flatten_event(true)
                    .init();
            }
        }

        InitializedEntrypoint { env: self.env }
    }
}
