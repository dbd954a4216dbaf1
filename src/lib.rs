//! skein - lazy dependency resolution with composable designs
//!
//! Three pieces cooperate:
//!
//! - [`Design`]: an immutable registry mapping binding keys to providers.
//!   Designs compose with `+`; the right-hand side wins on collisions, so a
//!   test or environment overlay can override any binding without touching
//!   the base design.
//! - [`Injected`]: a lazy expression describing "a value obtainable once its
//!   dependencies are resolved". Combinators (`map`, `zip`, `apply`) build
//!   an expression tree; nothing runs at build time.
//! - [`Resolver`]: evaluates an expression against a design. It collects the
//!   transitive dependency closure, rejects cycles before any provider runs,
//!   evaluates independent subtrees concurrently, and memoizes each key for
//!   its own lifetime.
//!
//! ```
//! use skein::{Design, Resolver};
//! use skein::provider::{from_value, to_value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), skein::SkeinError> {
//! let design = Design::new()
//!     .bind_instance("host", String::from("localhost"))
//!     .bind_instance("port", 5432u16)
//!     .bind_provider("dsn", ["host", "port"], |deps| {
//!         let host: String = from_value(&deps[0])?;
//!         let port: u16 = from_value(&deps[1])?;
//!         Ok(to_value(format!("{host}:{port}")))
//!     });
//!
//! let resolver = Resolver::new(design);
//! let dsn: String = resolver.resolve_key("dsn").await?;
//! assert_eq!(dsn, "localhost:5432");
//! # Ok(())
//! # }
//! ```

pub mod design;
pub mod error;
pub mod graph;
pub mod injected;
pub mod key;
pub mod provider;
pub mod resolver;
pub mod util;

pub use design::Design;
pub use error::{FixSuggestion, Result, SkeinError};
pub use injected::Injected;
pub use key::{BindingKey, TypeTag};
pub use provider::{from_value, to_value, Provider, Value};
pub use resolver::Resolver;
