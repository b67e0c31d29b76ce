// ── Command batches and submission ──

use serde::Serialize;
use tracing::{debug, warn};

use super::{Command, Direction};
use crate::error::CoreError;

/// Persistence collaborator. One call per command, no batching or retries.
pub trait Backend {
    fn apply(&mut self, command: &Command) -> Result<(), CoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub direction: Direction,
    pub command: Command,
}

/// Commands the caller must submit together, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandBatch {
    entries: Vec<BatchEntry>,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(command: Command) -> Self {
        let mut batch = Self::new();
        batch.push(Direction::Forward, command);
        batch
    }

    pub fn push(&mut self, direction: Direction, command: Command) {
        self.entries.push(BatchEntry { direction, command });
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter().map(|e| &e.command)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Why a batch did not go through, and what state it left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    /// The write that failed.
    pub error: CoreError,
    /// Applied writes that were successfully undone.
    pub rolled_back: Vec<Command>,
    /// Applied writes that could not be undone and need manual cleanup.
    pub stranded: Vec<Command>,
}

impl std::fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.stranded.is_empty() {
            write!(f, " ({} write(s) left applied)", self.stranded.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for SubmitFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Apply every command in order. On the first failure, undo the commands
/// already applied (newest first) and report the original error.
///
/// Compensation is best-effort: a command without a compensation, or whose
/// compensation is itself rejected, is reported as stranded.
pub fn submit_batch<B: Backend + ?Sized>(
    backend: &mut B,
    batch: &CommandBatch,
) -> Result<usize, SubmitFailure> {
    let mut applied: Vec<&Command> = Vec::with_capacity(batch.len());

    for entry in batch.entries() {
        debug!(
            op = entry.command.verb(),
            target = %entry.command.target(),
            direction = %entry.direction,
            "submitting command"
        );
        if let Err(error) = backend.apply(&entry.command) {
            warn!(
                %error,
                target = %entry.command.target(),
                applied = applied.len(),
                "command rejected, compensating applied writes"
            );
            let (rolled_back, stranded) = compensate(backend, &applied);
            return Err(SubmitFailure {
                error,
                rolled_back,
                stranded,
            });
        }
        applied.push(&entry.command);
    }

    Ok(applied.len())
}

fn compensate<B: Backend + ?Sized>(
    backend: &mut B,
    applied: &[&Command],
) -> (Vec<Command>, Vec<Command>) {
    let mut rolled_back = Vec::new();
    let mut stranded = Vec::new();

    for &command in applied.iter().rev() {
        let Some(undo) = command.compensation() else {
            warn!(target = %command.target(), "no compensation for command");
            stranded.push(command.clone());
            continue;
        };
        match backend.apply(&undo) {
            Ok(()) => rolled_back.push(command.clone()),
            Err(e) => {
                warn!(error = %e, target = %command.target(), "compensation failed");
                stranded.push(command.clone());
            }
        }
    }

    (rolled_back, stranded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Connection, EntityId, SwitchSwitch};

    /// Records applied commands and rejects the Nth call.
    #[derive(Default)]
    struct Recorder {
        log: Vec<Command>,
        fail_on: Option<usize>,
        calls: usize,
    }

    impl Backend for Recorder {
        fn apply(&mut self, command: &Command) -> Result<(), CoreError> {
            self.calls += 1;
            if self.fail_on == Some(self.calls) {
                return Err(CoreError::Backend {
                    message: "HTTP 500".into(),
                });
            }
            self.log.push(command.clone());
            Ok(())
        }
    }

    fn link(src: u64, dst: u64, portname: &str) -> Connection {
        Connection::SwitchSwitch(SwitchSwitch {
            project_id: EntityId::new(1),
            switch_id_src: EntityId::new(src),
            switch_id_dst: EntityId::new(dst),
            portname: portname.into(),
        })
    }

    fn mirrored_create() -> CommandBatch {
        let mut batch = CommandBatch::new();
        batch.push(
            Direction::Forward,
            Command::CreateConnection {
                connection: link(4, 5, "AB"),
            },
        );
        batch.push(
            Direction::Reverse,
            Command::CreateConnection {
                connection: link(5, 4, "BA"),
            },
        );
        batch
    }

    #[test]
    fn applies_every_command_in_order() {
        let mut backend = Recorder::default();
        let batch = mirrored_create();
        assert_eq!(submit_batch(&mut backend, &batch).unwrap(), 2);
        let applied: Vec<_> = batch.commands().cloned().collect();
        assert_eq!(backend.log, applied);
    }

    #[test]
    fn half_applied_mirror_is_compensated() {
        let mut backend = Recorder {
            fail_on: Some(2),
            ..Recorder::default()
        };
        let failure = submit_batch(&mut backend, &mirrored_create()).unwrap_err();

        assert_eq!(failure.error.kind(), crate::error::ErrorKind::Backend);
        assert!(failure.stranded.is_empty());
        assert_eq!(failure.rolled_back.len(), 1);
        // forward create, then its compensating delete
        assert_eq!(
            backend.log,
            vec![
                Command::CreateConnection {
                    connection: link(4, 5, "AB")
                },
                Command::DeleteConnection {
                    connection: link(4, 5, "AB")
                },
            ]
        );
    }

    #[test]
    fn failed_compensation_is_reported_as_stranded() {
        // create ok, reverse create fails, compensating delete fails too
        let mut backend = Recorder::default();
        struct Flaky<'a>(&'a mut Recorder);
        impl Backend for Flaky<'_> {
            fn apply(&mut self, command: &Command) -> Result<(), CoreError> {
                if self.0.calls >= 1 {
                    self.0.calls += 1;
                    return Err(CoreError::Backend {
                        message: "gone".into(),
                    });
                }
                self.0.apply(command)
            }
        }
        let failure = submit_batch(&mut Flaky(&mut backend), &mirrored_create()).unwrap_err();
        assert!(failure.rolled_back.is_empty());
        assert_eq!(failure.stranded.len(), 1);
        assert!(failure.to_string().contains("1 write(s) left applied"));
    }

    #[test]
    fn first_failure_applies_nothing() {
        let mut backend = Recorder {
            fail_on: Some(1),
            ..Recorder::default()
        };
        let failure = submit_batch(&mut backend, &mirrored_create()).unwrap_err();
        assert!(backend.log.is_empty());
        assert!(failure.rolled_back.is_empty());
    }
}
