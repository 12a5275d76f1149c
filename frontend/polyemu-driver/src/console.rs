//! Line-oriented progress output with nested indentation

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug, Display, Formatter};

type Sink = Box<dyn FnMut(&str)>;

/// Writes whole lines to a sink, prefixing each with one space per indentation level.
///
/// Every line is also mirrored to the `debug` log level.
pub struct Console {
    indent: Cell<usize>,
    sink: RefCell<Sink>,
}

impl Console {
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_sink(|line| println!("{line}"))
    }

    #[must_use]
    pub fn with_sink(sink: impl FnMut(&str) + 'static) -> Self {
        Self { indent: Cell::new(0), sink: RefCell::new(Box::new(sink)) }
    }

    pub fn println(&self, line: impl Display) {
        let line = format!("{:indent$}{line}", "", indent = self.indent.get());
        log::debug!("{line}");
        let mut sink = self.sink.borrow_mut();
        (*sink)(&line);
    }

    /// Increase the indentation level until the returned guard is dropped.
    #[must_use]
    pub fn indent(&self) -> IndentGuard<'_> {
        let previous = self.indent.get();
        self.indent.set(previous + 1);
        IndentGuard { console: self, previous }
    }

    #[must_use]
    pub fn level(&self) -> usize {
        self.indent.get()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Debug for Console {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").field("indent", &self.indent.get()).finish_non_exhaustive()
    }
}

#[must_use]
pub struct IndentGuard<'a> {
    console: &'a Console,
    previous: usize,
}

impl Drop for IndentGuard<'_> {
    fn drop(&mut self) {
        self.console.indent.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn capturing_console() -> (Console, Rc<RefCell<Vec<String>>>) {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink_lines = Rc::clone(&lines);
        let console = Console::with_sink(move |line| sink_lines.borrow_mut().push(line.into()));
        (console, lines)
    }

    #[test]
    fn nested_indentation() {
        let (console, lines) = capturing_console();

        console.println("a");
        {
            let _indent = console.indent();
            console.println("b");
            {
                let _indent = console.indent();
                console.println("c");
            }
            console.println("d");
        }
        console.println("e");

        assert_eq!(*lines.borrow(), vec!["a", " b", "  c", " d", "e"]);
    }

    #[test]
    fn indentation_restored_on_early_return() {
        fn fails(console: &Console) -> Result<(), ()> {
            let _indent = console.indent();
            console.println("inside");
            Err(())
        }

        let (console, lines) = capturing_console();
        assert!(fails(&console).is_err());
        assert_eq!(console.level(), 0);

        console.println("after");
        assert_eq!(*lines.borrow(), vec![" inside", "after"]);
    }
}
