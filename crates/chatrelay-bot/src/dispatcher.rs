//! Dispatcher: routes incoming messages to the reply pipeline, one task per
//! message.

use std::sync::Arc;

use chatrelay_common::{IncomingMessage, Scope};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::messenger::Messenger;
use crate::pipeline::{ReplyPipeline, Replier};

#[derive(Clone)]
pub struct Dispatcher {
    pipeline: Arc<ReplyPipeline>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<ReplyPipeline>) -> Self {
        Self { pipeline }
    }

    /// Pick the replier for a message, or `None` if the bot should stay
    /// silent. Group messages need an explicit mention; when the bridge told
    /// us our own nickname, the content must also contain it.
    pub fn route(message: &IncomingMessage, self_name: Option<&str>) -> Option<Replier> {
        let addressed = match message.scope {
            Scope::Direct => true,
            Scope::Group => {
                let named = self_name
                    .filter(|name| !name.is_empty())
                    .map_or(true, |name| message.content.contains(name));
                message.is_mentioned && named
            }
        };
        addressed.then(|| Replier::for_scope(message.scope))
    }

    /// Spawn a reply task for `message`. Returns `None` when the message is
    /// ignored without touching the pipeline.
    pub fn dispatch(
        &self,
        message: IncomingMessage,
        self_name: Option<&str>,
        messenger: Arc<dyn Messenger>,
    ) -> Option<JoinHandle<()>> {
        let Some(replier) = Self::route(&message, self_name) else {
            debug!(message_id = %message.id, "Ignoring unmentioned group message");
            return None;
        };

        let pipeline = self.pipeline.clone();
        Some(tokio::spawn(async move {
            match pipeline.reply(replier, &message, messenger.as_ref()).await {
                Ok(outcome) => {
                    debug!(message_id = %message.id, ?outcome, "Reply round finished");
                }
                Err(e) => {
                    warn!(message_id = %message.id, error = %e, "Reply round failed");
                }
            }
        }))
    }
}
