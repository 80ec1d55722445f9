use tokio::sync::broadcast;
use tracing::trace;

// Called after a mutation has been persisted; must not block
pub trait VaultObserver: Send + Sync {
	fn vault_changed(&self);
}

// the only intent carried: derived menus/views are stale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rebuild;

#[derive(Clone)]
pub struct MenuSignal {
	tx: broadcast::Sender<Rebuild>,
}

impl MenuSignal {
	pub fn new() -> Self {
		// receivers only care that something changed, so a lagging one loses nothing
		let (tx, _) = broadcast::channel(1);

		Self { tx }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Rebuild> {
		self.tx.subscribe()
	}
}

impl Default for MenuSignal {
	fn default() -> Self {
		Self::new()
	}
}

impl VaultObserver for MenuSignal {
	fn vault_changed(&self) {
		if self.tx.send(Rebuild).is_err() {
			trace!("no menu subscribers");
		}
	}
}
