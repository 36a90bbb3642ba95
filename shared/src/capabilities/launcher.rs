//! Hands URLs and phone numbers to the platform: deep links open the
//! matching app, `Dial` starts a call.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LauncherOperation {
    OpenUrl { url: String },
    Dial { number: String },
}

impl Operation for LauncherOperation {
    type Output = ();
}

#[derive(Clone)]
pub struct Launcher<Ev> {
    context: CapabilityContext<LauncherOperation, Ev>,
}

impl<Ev> Capability<Ev> for Launcher<Ev> {
    type Operation = LauncherOperation;
    type MappedSelf<MappedEv> = Launcher<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Launcher::new(self.context.map_event(f))
    }
}

impl<Ev> Launcher<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<LauncherOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn open_url(&self, url: impl Into<String>) {
        let url = url.into();
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(LauncherOperation::OpenUrl { url }).await;
        });
    }

    /// Equivalent of navigating to `tel:{number}`.
    pub fn dial(&self, number: impl Into<String>) {
        let number = number.into();
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(LauncherOperation::Dial { number }).await;
        });
    }
}
