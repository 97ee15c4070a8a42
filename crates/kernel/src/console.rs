use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::rc::Rc;

/// Text shown after a process ends, inviting the next command.
pub const PROMPT: &str = "> ";

/// Standard output/input collaborator. The kernel writes every user-visible
/// message through this and never touches a screen directly.
pub trait Console: Debug {
    fn put_text(&mut self, text: &str);

    fn advance_line(&mut self);

    fn clear_screen(&mut self) {}

    /// Consumes characters buffered by the keyboard ISR.
    fn handle_input(&mut self, input: &mut VecDeque<char>) {
        input.clear();
    }
}

/// Writes straight to the host's stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn put_text(&mut self, text: &str) {
        print!("{}", text);
    }

    fn advance_line(&mut self) {
        println!();
    }

    fn handle_input(&mut self, input: &mut VecDeque<char>) {
        for ch in input.drain(..) {
            match ch {
                '\n' => self.advance_line(),
                '\u{8}' => {}
                other => self.put_text(other.encode_utf8(&mut [0u8; 4])),
            }
        }
    }
}

#[derive(Debug, Default)]
struct Screen {
    lines: Vec<String>,
    current: String,
    typed: String,
}

/// Captures everything written to it. Clones share the same screen, so a
/// test can keep one handle while the kernel owns the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingConsole {
    screen: Rc<RefCell<Screen>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full output, lines joined with '\n'.
    pub fn output(&self) -> String {
        let screen = self.screen.borrow();
        let mut out = screen.lines.join("\n");
        if !screen.lines.is_empty() {
            out.push('\n');
        }
        out.push_str(&screen.current);
        out
    }

    /// Completed lines only.
    pub fn lines(&self) -> Vec<String> {
        self.screen.borrow().lines.clone()
    }

    /// Characters received from the keyboard, after backspace handling.
    pub fn typed(&self) -> String {
        self.screen.borrow().typed.clone()
    }
}

impl Console for RecordingConsole {
    fn put_text(&mut self, text: &str) {
        self.screen.borrow_mut().current.push_str(text);
    }

    fn advance_line(&mut self) {
        let mut screen = self.screen.borrow_mut();
        let line = std::mem::take(&mut screen.current);
        screen.lines.push(line);
    }

    fn clear_screen(&mut self) {
        let mut screen = self.screen.borrow_mut();
        screen.lines.clear();
        screen.current.clear();
    }

    fn handle_input(&mut self, input: &mut VecDeque<char>) {
        let mut screen = self.screen.borrow_mut();
        for ch in input.drain(..) {
            if ch == '\u{8}' {
                screen.typed.pop();
            } else {
                screen.typed.push(ch);
            }
        }
    }
}
