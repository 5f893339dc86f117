//! In-game debug console
//!
//! Commands are registered against a context type (`World` in the Bevy
//! plugin, anything in tests) and dispatched from text lines:
//!
//! ```
//! use gameplay_core::console::{CommandArgs, Console, ParamSpec};
//!
//! let mut console: Console<f32> = Console::new(16);
//! console.register(
//!     "scale",
//!     "Scale the value",
//!     vec![ParamSpec::float("by")],
//!     |v: &mut f32, args: &CommandArgs| {
//!         *v *= args.float(0).unwrap_or(1.0);
//!         format!("value: {}", v)
//!     },
//! );
//!
//! let mut value = 2.0;
//! console.submit(&mut value, "scale 1.5");
//! assert_eq!(value, 3.0);
//! ```

pub mod command;
pub mod debug_console;
pub mod entry;
pub mod registry;

pub use command::{ArgValue, CommandArgs, CommandOutput, ParamSpec, ParamType};
pub use debug_console::Console;
pub use entry::{ConsoleEntry, ConsoleEntryType};
pub use registry::{CommandHandler, CommandRegistry};
