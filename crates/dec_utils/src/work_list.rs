use alloc::vec::Vec;

// -----------------------------------------------------------------------------
// WorkList

/// A LIFO list of pending tasks.
///
/// Deep recursion is flattened by pushing a tagged task instead of
/// calling into the next level, then draining the list with a plain loop.
/// Tasks may push further tasks while the list is drained, the loop keeps
/// going until the list is empty.
///
/// The task type is usually an enum naming each kind of pending work.
///
/// # Examples
///
/// ```
/// use dec_utils::WorkList;
///
/// enum Task { Count(u32) }
///
/// let mut list = WorkList::new();
/// list.push(Task::Count(10_000));
///
/// let mut visited = 0;
/// list.drain(|list, Task::Count(n)| {
///     visited += 1;
///     if n > 0 {
///         list.push(Task::Count(n - 1));
///     }
/// });
/// assert_eq!(visited, 10_001);
/// ```
#[derive(Debug)]
pub struct WorkList<T> {
    tasks: Vec<T>,
}

impl<T> WorkList<T> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Pushes a task to the top of the list.
    #[inline]
    pub fn push(&mut self, task: T) {
        self.tasks.push(task);
    }

    /// Pops the most recently pushed task.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.tasks.pop()
    }

    /// Returns the number of pending tasks.
    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if nothing is pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs `f` on every task until the list is empty.
    ///
    /// `f` receives the list itself, so it may push follow-up tasks.
    pub fn drain(&mut self, mut f: impl FnMut(&mut Self, T)) {
        while let Some(task) = self.tasks.pop() {
            f(self, task);
        }
    }
}

impl<T> Default for WorkList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::WorkList;

    #[test]
    fn drains_in_lifo_order() {
        let mut list = WorkList::new();
        list.push(1);
        list.push(2);
        list.push(3);

        let mut seen = Vec::new();
        list.drain(|_, task| seen.push(task));
        assert_eq!(seen, [3, 2, 1]);
        assert!(list.is_empty());
    }

    #[test]
    fn follow_up_tasks_run_before_older_ones() {
        let mut list = WorkList::new();
        list.push("old");
        list.push("spawn");

        let mut seen = Vec::new();
        list.drain(|list, task| {
            if task == "spawn" {
                list.push("child");
            }
            seen.push(task);
        });
        assert_eq!(seen, ["spawn", "child", "old"]);
    }
}
