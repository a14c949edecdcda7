//! Wiring: one set of components built from one [`Settings`] value.

use std::sync::Arc;

use originstamp_client::{Mailer, SubmissionClient, TimestampApi};
use originstamp_core::Settings;
use originstamp_store::Ledger;

use crate::gateway::{GatewayConfig, RetrievalGateway};
use crate::stamper::Stamper;

/// The stamper and gateway, sharing one ledger and one service client.
///
/// Settings are captured at construction. A settings change builds a new
/// `Services` rather than mutating this one.
pub struct Services<L, A, M> {
    pub settings: Settings,
    pub stamper: Stamper<L, A, M>,
    pub gateway: RetrievalGateway<L, A>,
}

impl<L, A, M> Services<L, A, M>
where
    L: Ledger,
    A: TimestampApi,
    M: Mailer,
{
    pub fn build(
        settings: Settings,
        ledger: Arc<L>,
        api: Arc<A>,
        mailer: Arc<M>,
        gateway_config: GatewayConfig,
    ) -> Self {
        let client = SubmissionClient::new(settings.clone(), Arc::clone(&api), mailer);
        Self {
            stamper: Stamper::new(Arc::clone(&ledger), client),
            gateway: RetrievalGateway::new(ledger, api, settings.clone(), gateway_config),
            settings,
        }
    }
}
