use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use app_settings::RemoverSettings;
use engine::{BackgroundRemover, RemovalError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RemoverError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{program} produced no output")]
    EmptyOutput { program: String },
}

/// Pipes image bytes through an external background-removal command.
#[derive(Debug, Clone)]
pub struct CommandRemover {
    program: String,
    args: Vec<String>,
}

impl CommandRemover {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &RemoverSettings) -> Self {
        Self::new(settings.program.clone(), settings.args.clone())
    }

    fn run(&self, input: &[u8]) -> Result<Vec<u8>, RemoverError> {
        debug!("running {} {:?} on {} bytes", self.program, self.args, input.len());
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RemoverError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a chatty child cannot deadlock us.
        let writer = child.stdin.take().map(|mut stdin| {
            let payload = input.to_vec();
            thread::spawn(move || stdin.write_all(&payload))
        });

        let output = child.wait_with_output().map_err(|source| RemoverError::Io {
            program: self.program.clone(),
            source,
        })?;
        let write_result = writer.map(|handle| stdin_result(handle.join()));

        if !output.status.success() {
            return Err(RemoverError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Some(Err(source)) = write_result {
            return Err(RemoverError::Io {
                program: self.program.clone(),
                source,
            });
        }
        if output.stdout.is_empty() {
            return Err(RemoverError::EmptyOutput {
                program: self.program.clone(),
            });
        }
        Ok(output.stdout)
    }
}

/// Flatten the stdin writer's join result; a panicked writer counts as I/O failure.
fn stdin_result(joined: thread::Result<io::Result<()>>) -> io::Result<()> {
    joined.unwrap_or_else(|_| Err(io::Error::other("stdin writer thread panicked")))
}

impl BackgroundRemover for CommandRemover {
    fn remove_background_bytes(&self, input: &[u8]) -> Result<Vec<u8>, RemovalError> {
        self.run(input).map_err(RemovalError::from)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn passes_bytes_through_the_command() {
        let remover = CommandRemover::new("cat", Vec::new());
        let out = remover.remove_background_bytes(b"\x89PNG fake").unwrap();
        assert_eq!(out, b"\x89PNG fake");
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let remover = CommandRemover::new(
            "sh",
            vec!["-c".into(), "echo model missing >&2; exit 3".into()],
        );
        let err = remover.run(b"img").unwrap_err();
        match err {
            RemoverError::Failed { stderr, status, .. } => {
                assert_eq!(stderr, "model missing");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let remover = CommandRemover::new("recast-no-such-remover", Vec::new());
        assert!(matches!(
            remover.run(b"img"),
            Err(RemoverError::Spawn { .. })
        ));
    }

    #[test]
    fn empty_output_is_rejected() {
        let remover = CommandRemover::new("sh", vec!["-c".into(), "cat > /dev/null".into()]);
        assert!(matches!(
            remover.run(b"img"),
            Err(RemoverError::EmptyOutput { .. })
        ));
    }

    #[test]
    fn panicked_stdin_writer_is_an_io_error() {
        let joined = thread::spawn(|| -> io::Result<()> { panic!("writer died") }).join();
        let err = stdin_result(joined).unwrap_err();
        assert!(err.to_string().contains("panicked"));

        let joined = thread::spawn(|| -> io::Result<()> { Ok(()) }).join();
        assert!(stdin_result(joined).is_ok());
    }

    #[test]
    fn built_from_settings() {
        let remover = CommandRemover::from_settings(&RemoverSettings::default());
        assert_eq!(remover.program, "rembg");
        assert_eq!(remover.args, vec!["i".to_string()]);
    }
}
