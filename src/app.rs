use crate::errors::ApiError;
use crate::managers;
use crate::services::api_client::ApiClient;
use crate::services::config::ClientConfig;
use crate::services::logger::Logger;
use crate::services::session::{FileStore, KeyValueStore, SessionService};
use crate::services::transport::{HttpTransport, Transport};
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub config: ClientConfig,
    pub api: ApiClient,
    pub auth: managers::auth::AuthManager,
    pub channels: managers::channels::ChannelsManager,
    pub messages: managers::messages::MessagesManager,
    pub search: managers::search::SearchManager,
    pub moderation: managers::moderation::ModerationManager,
    pub presence: managers::presence::PresenceManager,
    pub chatbots: managers::chatbots::ChatbotManager,
}

impl App {
    /// Production wiring: file-backed session, reqwest transport.
    pub fn initialize(config: ClientConfig) -> Result<Self, ApiError> {
        let logger = Logger::new("chatgw");
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.session_path)?);
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(logger.clone(), &config.user_agent)?);
        Ok(Self::with_parts(logger, config, store, transport))
    }

    pub fn with_parts(
        logger: Logger,
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let session = Arc::new(SessionService::new(logger.clone(), store));
        let api = ApiClient::new(logger.clone(), &config.base_url, transport, session);

        let presence = managers::presence::PresenceManager::new(logger.clone(), api.clone());
        let auth = managers::auth::AuthManager::new(logger.clone(), api.clone(), presence.clone());
        let channels = managers::channels::ChannelsManager::new(logger.clone(), api.clone());
        let messages = managers::messages::MessagesManager::new(api.clone());
        let search = managers::search::SearchManager::new(api.clone());
        let moderation = managers::moderation::ModerationManager::new(api.clone());
        let chatbots = managers::chatbots::ChatbotManager::new(logger.clone(), api.clone());

        logger.debug(
            "client initialized",
            Some(&serde_json::json!({ "base_url": api.base_url() })),
        );

        Self {
            logger,
            config,
            api,
            auth,
            channels,
            messages,
            search,
            moderation,
            presence,
            chatbots,
        }
    }
}
