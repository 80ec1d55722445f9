use std::process::Stdio;

use async_trait::async_trait;
use serde::Serialize;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
	#[error("no clipboard available")]
	Unavailable,
	#[error("clipboard command exited with {0}")]
	Exit(std::process::ExitStatus),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Clipboard: Send + Sync {
	async fn write_text(&self, text: &str) -> Result<(), DeliveryError>;
}

// shows the text to the user so it can be copied by hand
#[async_trait]
pub trait ManualCopy: Send + Sync {
	async fn present(&self, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivered {
	Clipboard,
	Manual,
}

// a clipboard failure is absorbed as long as the fallback works
pub async fn deliver(
	text: &str,
	clipboard: &dyn Clipboard,
	fallback: &dyn ManualCopy,
) -> Result<Delivered, DeliveryError> {
	match clipboard.write_text(text).await {
		Ok(()) => Ok(Delivered::Clipboard),
		Err(e) => {
			warn!(error = %e, "clipboard unavailable, falling back to manual copy");

			fallback.present(text).await?;

			Ok(Delivered::Manual)
		}
	}
}

pub struct NoClipboard;

#[async_trait]
impl Clipboard for NoClipboard {
	async fn write_text(&self, _: &str) -> Result<(), DeliveryError> {
		Err(DeliveryError::Unavailable)
	}
}

// pipes the text into an external tool's stdin, eg `wl-copy` or `xclip -selection clipboard`
pub struct CommandClipboard {
	program: String,
	args: Vec<String>,
}

impl CommandClipboard {
	pub fn new(argv: &[String]) -> Option<Self> {
		let (program, args) = argv.split_first()?;

		Some(Self {
			program: program.clone(),
			args: args.to_vec(),
		})
	}
}

#[async_trait]
impl Clipboard for CommandClipboard {
	async fn write_text(&self, text: &str) -> Result<(), DeliveryError> {
		let mut child = Command::new(&self.program)
			.args(&self.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.kill_on_drop(true)
			.spawn()?;

		if let Some(mut stdin) = child.stdin.take() {
			stdin.write_all(text.as_bytes()).await?;
		}

		let status = child.wait().await?;

		if status.success() {
			Ok(())
		} else {
			Err(DeliveryError::Exit(status))
		}
	}
}

pub struct Prompt;

#[async_trait]
impl ManualCopy for Prompt {
	async fn present(&self, text: &str) -> Result<(), DeliveryError> {
		let mut stderr = tokio::io::stderr();

		stderr
			.write_all(format!("Copy your one-time login link:\n{}\n", text).as_bytes())
			.await?;
		stderr.flush().await?;

		Ok(())
	}
}
