#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

use crate::config::Config;
use crate::error::TodoError;
use crate::task::model::{Priority, Status};
use crate::task::storage::Backend;
use crate::task::store::{TaskEdit, TaskStore};

use super::{decorate, print_statistics, print_task_table};

const MENU: &str = "
--- To-Do List ---
1. Add task
2. List tasks
3. Search tasks
4. Update task status
5. Edit task
6. Remove task
7. Show statistics
8. Exit";

/// Numbered menu over `input`. Store errors are printed and the loop goes on;
/// end of input leaves the loop.
pub fn run<B: Backend>(
    cfg: &Config,
    store: &mut TaskStore<B>,
    input: impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut menu = Menu {
        cfg,
        store,
        input,
        out,
    };
    menu.run()
}

struct Menu<'a, B: Backend, R, W> {
    cfg: &'a Config,
    store: &'a mut TaskStore<B>,
    input: R,
    out: &'a mut W,
}

enum Step {
    Continue,
    Exit,
}

impl<B: Backend, R: BufRead, W: Write> Menu<'_, B, R, W> {
    fn run(&mut self) -> anyhow::Result<()> {
        loop {
            writeln!(self.out, "{MENU}")?;
            let Some(choice) = self.ask("Enter your choice (1-8): ")? else {
                break;
            };
            let result = match choice.as_str() {
                "1" => self.add(),
                "2" => self.list(),
                "3" => self.search(),
                "4" => self.update_status(),
                "5" => self.edit(),
                "6" => self.remove(),
                "7" => self.statistics(),
                "8" => {
                    writeln!(self.out, "{}", decorate(self.cfg, "👋", "Goodbye!"))?;
                    break;
                }
                _ => {
                    self.warn("Invalid choice, try again.")?;
                    continue;
                }
            };
            match result {
                Ok(Step::Continue) => {}
                Ok(Step::Exit) => break,
                Err(err) => match err.downcast::<TodoError>() {
                    Ok(err) if err.is_recoverable() => self.warn(&err.to_string())?,
                    Ok(err) => writeln!(self.out, "Error: {err}")?,
                    Err(other) => return Err(other),
                },
            }
        }
        Ok(())
    }

    /// `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    fn warn(&mut self, msg: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{}", decorate(self.cfg, "⚠️", msg))?;
        Ok(())
    }

    fn ask_id(&mut self) -> anyhow::Result<Option<u32>> {
        let Some(raw) = self.ask("Enter task ID: ")? else {
            return Ok(None);
        };
        let id = raw
            .parse::<u32>()
            .map_err(|_| TodoError::Validation("please enter a valid number".to_owned()))?;
        Ok(Some(id))
    }

    fn add(&mut self) -> anyhow::Result<Step> {
        let Some(description) = self.ask("Task description: ")? else {
            return Ok(Step::Exit);
        };
        let Some(priority) = self.ask(&format!(
            "Priority (low/medium/high) [{}]: ",
            self.cfg.defaults.priority
        ))?
        else {
            return Ok(Step::Exit);
        };
        let priority = if priority.is_empty() {
            self.cfg.defaults.priority
        } else {
            priority.parse::<Priority>()?
        };
        let Some(category) = self.ask(&format!("Category [{}]: ", self.cfg.defaults.category))?
        else {
            return Ok(Step::Exit);
        };
        let category = if category.is_empty() {
            self.cfg.defaults.category.clone()
        } else {
            category
        };
        let Some(due) = self.ask("Due date (YYYY-MM-DD, optional): ")? else {
            return Ok(Step::Exit);
        };

        let task = self
            .store
            .add(&description, priority, &category, Some(due.as_str()))?;
        writeln!(
            self.out,
            "{}",
            decorate(
                self.cfg,
                "✅",
                &format!("Task added: #{} {}", task.id, task.description)
            )
        )?;
        Ok(Step::Continue)
    }

    fn list(&mut self) -> anyhow::Result<Step> {
        let Some(status) = self.ask("Filter by status (pending/in-progress/completed, blank for all): ")?
        else {
            return Ok(Step::Exit);
        };
        let status = if status.is_empty() {
            None
        } else {
            Some(status.parse::<Status>()?)
        };
        let Some(category) = self.ask("Filter by category (blank for all): ")? else {
            return Ok(Step::Exit);
        };
        let category = (!category.is_empty()).then_some(category);

        let tasks = self.store.list(status, category.as_deref());
        print_task_table(self.cfg, &tasks, false, &mut *self.out)?;
        Ok(Step::Continue)
    }

    fn search(&mut self) -> anyhow::Result<Step> {
        let Some(keyword) = self.ask("Search keyword: ")? else {
            return Ok(Step::Exit);
        };
        let found = self.store.search(&keyword)?;
        print_task_table(self.cfg, &found, false, &mut *self.out)?;
        Ok(Step::Continue)
    }

    fn update_status(&mut self) -> anyhow::Result<Step> {
        let Some(id) = self.ask_id()? else {
            return Ok(Step::Exit);
        };
        let Some(status) = self.ask("New status (pending/in-progress/completed): ")? else {
            return Ok(Step::Exit);
        };
        let status = status.parse::<Status>()?;
        let task = self.store.update_status(id, status)?;
        writeln!(
            self.out,
            "{}",
            decorate(
                self.cfg,
                task.status.icon(),
                &format!("Task #{} is now {}", task.id, task.status)
            )
        )?;
        Ok(Step::Continue)
    }

    fn edit(&mut self) -> anyhow::Result<Step> {
        let Some(id) = self.ask_id()? else {
            return Ok(Step::Exit);
        };
        // Fail before prompting for fields of a task that does not exist.
        self.store.get(id)?;

        let Some(description) = self.ask("New description (blank to keep): ")? else {
            return Ok(Step::Exit);
        };
        let Some(priority) = self.ask("New priority (blank to keep): ")? else {
            return Ok(Step::Exit);
        };
        let Some(category) = self.ask("New category (blank to keep): ")? else {
            return Ok(Step::Exit);
        };

        let edit = TaskEdit {
            description: (!description.is_empty()).then_some(description),
            priority: if priority.is_empty() {
                None
            } else {
                Some(priority.parse::<Priority>()?)
            },
            category: (!category.is_empty()).then_some(category),
        };
        if edit.is_empty() {
            writeln!(self.out, "Nothing changed.")?;
            return Ok(Step::Continue);
        }
        let task = self.store.edit(id, edit)?;
        writeln!(
            self.out,
            "{}",
            decorate(
                self.cfg,
                "✏️",
                &format!("Task updated: #{} {}", task.id, task.description)
            )
        )?;
        Ok(Step::Continue)
    }

    fn remove(&mut self) -> anyhow::Result<Step> {
        let tasks: Vec<_> = self.store.tasks().iter().collect();
        print_task_table(self.cfg, &tasks, false, &mut *self.out)?;
        let Some(id) = self.ask_id()? else {
            return Ok(Step::Exit);
        };
        let task = self.store.remove(id)?;
        writeln!(
            self.out,
            "{}",
            decorate(
                self.cfg,
                "❌",
                &format!("Task removed: #{} {}", task.id, task.description)
            )
        )?;
        Ok(Step::Continue)
    }

    fn statistics(&mut self) -> anyhow::Result<Step> {
        let stats = self.store.statistics();
        print_statistics(&stats, &mut *self.out)?;
        Ok(Step::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::storage::MemoryBackend;

    fn session(store: &mut TaskStore<MemoryBackend>, script: &str) -> String {
        let mut cfg = Config::default();
        cfg.ui.icons = false;
        let mut out = Vec::new();
        run(&cfg, store, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn add_then_list_then_exit() {
        let mut store = TaskStore::open(MemoryBackend::new());
        let out = session(&mut store, "1\nBuy milk\n\nErrands\n\n2\n\n\n8\n");
        assert!(out.contains("Task added: #1 Buy milk"));
        assert!(out.contains("Goodbye!"));
        let task = store.get(1).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, "Errands");
        assert!(task.due_date.is_none());
    }

    #[test]
    fn bad_numbers_and_unknown_ids_are_reported() {
        let mut store = TaskStore::open(MemoryBackend::new());
        let out = session(&mut store, "6\nabc\n4\n3\ndone\n9\n8\n");
        assert!(out.contains("please enter a valid number"));
        assert!(out.contains("task #3 not found"));
        assert!(out.contains("Invalid choice, try again."));
    }

    #[test]
    fn edit_keeps_blank_fields() {
        let mut store = TaskStore::open(MemoryBackend::new());
        store
            .add("Buy milk", Priority::High, "Errands", None)
            .unwrap();
        let out = session(&mut store, "5\n1\nBuy oat milk\n\n\n8\n");
        assert!(out.contains("Task updated: #1 Buy oat milk"));
        let task = store.get(1).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, "Errands");
    }

    #[test]
    fn empty_search_is_a_validation_message() {
        let mut store = TaskStore::open(MemoryBackend::new());
        let out = session(&mut store, "3\n\n8\n");
        assert!(out.contains("search keyword cannot be empty"));
    }

    #[test]
    fn end_of_input_leaves_the_loop() {
        let mut store = TaskStore::open(MemoryBackend::new());
        let out = session(&mut store, "1\nhalf a task");
        assert!(!out.contains("Task added"));
        assert!(store.tasks().is_empty());
    }
}
