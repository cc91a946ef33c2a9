//! The container mode stack.
//!
//! One entry per open container. The mode records what the scanner expects
//! next at that nesting level; the capacity hint is filled in by the
//! lookahead right after the entry is pushed and never changes afterwards.

use alloc::vec::Vec;

/// What kind of container is open at a given depth, and what the scanner
/// expects inside it next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Inside an array.
    Array,
    /// Inside an object, a member key (or `}`) comes next.
    ExpectKey,
    /// Inside an object, a member value comes next.
    ExpectValue,
    /// Sentinel for a finished document; never pushed during parsing.
    #[allow(dead_code)]
    Done,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry {
    pub mode: Mode,
    pub capacity_hint: usize,
}

/// Growable stack of open containers.
#[derive(Debug)]
pub(crate) struct ModeStack {
    entries: Vec<Entry>,
    max_depth: Option<usize>,
}

const INITIAL_CAPACITY: usize = 100;

impl ModeStack {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            entries: Vec::with_capacity(INITIAL_CAPACITY),
            max_depth,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn top_mode(&self) -> Option<Mode> {
        self.entries.last().map(|e| e.mode)
    }

    /// Count published by the most recent lookahead for the innermost open
    /// container; zero when nothing is open or no lookahead ran.
    pub fn top_hint(&self) -> usize {
        self.entries.last().map_or(0, |e| e.capacity_hint)
    }

    /// Pushes a new container. Fails only when a configured hard depth cap
    /// would be exceeded.
    pub fn push(&mut self, mode: Mode) -> bool {
        if let Some(cap) = self.max_depth {
            if self.entries.len() >= cap {
                return false;
            }
        }
        self.entries.push(Entry {
            mode,
            capacity_hint: 0,
        });
        true
    }

    /// Pops the top entry iff its mode is `expected`.
    pub fn pop(&mut self, expected: Mode) -> bool {
        match self.entries.last() {
            Some(entry) if entry.mode == expected => {
                self.entries.pop();
                true
            }
            _ => false,
        }
    }

    /// Rewrites the top mode from `from` to `to`.
    pub fn flip(&mut self, from: Mode, to: Mode) -> bool {
        match self.entries.last_mut() {
            Some(entry) if entry.mode == from => {
                entry.mode = to;
                true
            }
            _ => false,
        }
    }

    pub fn set_top_hint(&mut self, hint: usize) {
        if let Some(entry) = self.entries.last_mut() {
            entry.capacity_hint = hint;
        }
    }

    /// Forces the top mode without the `flip` check. Used by the lookahead
    /// when restoring its snapshot.
    pub fn restore_top_mode(&mut self, mode: Mode) {
        if let Some(entry) = self.entries.last_mut() {
            entry.mode = mode;
        }
    }

    /// Drops every entry above `depth`. Used by the lookahead when
    /// restoring its snapshot.
    pub fn truncate(&mut self, depth: usize) {
        self.entries.truncate(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_respects_modes() {
        let mut stack = ModeStack::new(None);
        assert!(stack.push(Mode::Array));
        assert!(stack.push(Mode::ExpectKey));
        assert!(!stack.pop(Mode::Array));
        assert!(stack.pop(Mode::ExpectKey));
        assert!(stack.pop(Mode::Array));
        assert!(stack.is_empty());
    }

    #[test]
    fn flip_only_matches_exact_mode() {
        let mut stack = ModeStack::new(None);
        stack.push(Mode::ExpectKey);
        assert!(!stack.flip(Mode::ExpectValue, Mode::ExpectKey));
        assert!(stack.flip(Mode::ExpectKey, Mode::ExpectValue));
        assert_eq!(stack.top_mode(), Some(Mode::ExpectValue));
    }

    #[test]
    fn hint_set_after_push_sticks_to_entry() {
        let mut stack = ModeStack::new(None);
        stack.push(Mode::Array);
        stack.set_top_hint(7);
        stack.push(Mode::Array);
        assert_eq!(stack.top_hint(), 0);
        stack.pop(Mode::Array);
        assert_eq!(stack.top_hint(), 7);
    }

    #[test]
    fn depth_cap_refuses_push() {
        let mut stack = ModeStack::new(Some(2));
        assert!(stack.push(Mode::Array));
        assert!(stack.push(Mode::Array));
        assert!(!stack.push(Mode::Array));
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut stack = ModeStack::new(None);
        for _ in 0..INITIAL_CAPACITY * 2 {
            assert!(stack.push(Mode::Array));
        }
        assert_eq!(stack.depth(), INITIAL_CAPACITY * 2);
    }
}
