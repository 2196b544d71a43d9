//! Output target for the `print` and `prepr` builtins.
//!
//! - `Stdout`: the default for embedded interpreters.
//! - `Buffer`: captures output so tests can assert on it.
//! - `Silent`: discards everything.

use std::sync::Arc;

use parking_lot::Mutex;

/// Print handler, dispatched by enum rather than trait object.
pub enum PrintHandlerImpl {
    Stdout,
    Buffer(Mutex<String>),
    Silent,
}

impl PrintHandlerImpl {
    /// Write `msg` followed by a newline.
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => println!("{msg}"),
            Self::Buffer(buf) => {
                let mut buf = buf.lock();
                buf.push_str(msg);
                buf.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Write `msg` as is.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => print!("{msg}"),
            Self::Buffer(buf) => buf.lock().push_str(msg),
            Self::Silent => {}
        }
    }

    /// Captured output. Empty for handlers that do not capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(buf) => buf.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(buf) = self {
            buf.lock().clear();
        }
    }
}

/// Print handler shared between a state and whoever reads its output.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

/// A handler that captures output for later [`PrintHandlerImpl::get_output`].
pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn buffer_handler_captures_in_order() {
        let handler = buffer_handler();
        handler.print("a ");
        handler.print("b ");
        handler.println("");
        handler.println("c");
        assert_eq!(handler.get_output(), "a b \nc\n");
    }

    #[test]
    fn clear_empties_the_capture() {
        let handler = buffer_handler();
        handler.println("hello");
        handler.clear();
        assert_eq!(handler.get_output(), "");
    }

    #[test]
    fn silent_handler_discards_output() {
        let handler = silent_handler();
        handler.println("hello");
        handler.print("world");
        assert_eq!(handler.get_output(), "");
    }

    #[test]
    fn stdout_handler_captures_nothing() {
        let handler = stdout_handler();
        handler.clear();
        assert_eq!(handler.get_output(), "");
    }
}
