//! Fixtures shared by command tests.

use std::sync::Arc;

use fabctl_client::mock::{MockFactory, MockResourceManagement};
use fabctl_core::{Config, Context, Home, Network, Output, SharedBuffer, Settings, Streams};
use tokio::sync::oneshot;

use crate::command::BaseCommand;

/// Settings writing to an in-memory buffer, with `config` loaded.
pub fn settings_with(config: Option<Config>) -> (Arc<Settings>, SharedBuffer) {
    settings_in(Home::new(std::env::temp_dir()), config)
}

/// Like [`settings_with`], rooted at `home`.
pub fn settings_in(home: Home, config: Option<Config>) -> (Arc<Settings>, SharedBuffer) {
    let out = SharedBuffer::new();
    let streams = Streams {
        out: Output::new(out.clone()),
        err: Output::new(SharedBuffer::new()),
    };
    let mut settings = Settings::new(home, streams);
    settings.config = config;
    (Arc::new(settings), out)
}

/// A configuration whose current context `foo` targets `mychannel`.
pub fn foo_config() -> Config {
    let mut config = Config::default();
    config.networks.insert(
        "local".to_string(),
        Network {
            gateway: "http://localhost:7443".to_string(),
            ..Network::default()
        },
    );
    config.contexts.insert(
        "foo".to_string(),
        Context {
            network: "local".to_string(),
            organization: "Org1MSP".to_string(),
            user: "Admin".to_string(),
            channel: "mychannel".to_string(),
            orderers: vec!["orderer.example.com".to_string()],
            peers: vec!["peer0.org1.example.com".to_string()],
        },
    );
    config.current_context = "foo".to_string();
    config
}

/// A base command over `factory` whose coordinator never fires.
pub fn mock_base(settings: Arc<Settings>, factory: Arc<MockFactory>) -> BaseCommand {
    let (_tx, rx) = oneshot::channel();
    BaseCommand::new(settings)
        .with_factory(factory)
        .with_shutdown_trigger(rx)
}

/// A factory and the recording client it hands out.
pub fn mock_factory() -> (Arc<MockFactory>, Arc<MockResourceManagement>) {
    let client = Arc::new(MockResourceManagement::default());
    let factory = Arc::new(MockFactory::with_client(client.clone()));
    (factory, client)
}
