use crate::admission::ItemValidator;
use crate::clients::{ItemClient, StoreClient};
use crate::config::OperatorConfig;
use crate::framework::{ResourceActor, ResourceClient};
use crate::model::{Item, Namespace, Store};
use crate::{item_controller, store_controller};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running operator: three store actors and the two controllers on top of them.
///
/// # Architecture
///
/// - **Store actors**: one [`ResourceActor`] each for Item, Store and Namespace
/// - **Item controller**: keeps `copy_count` on originals current
/// - **Store controller**: finalizer, companion namespace, cascade delete
///
/// Callers use [`item_client`](Self::item_client) (admission-gated) and
/// [`store_client`](Self::store_client). Controllers talk to the actors directly.
///
/// # Example
///
/// ```ignore
/// let system = OperatorSystem::start(&OperatorConfig::default());
///
/// system.store_client.create_store("downtown").await?;
/// system.item_client.create_item(item).await?;
///
/// system.shutdown().await?;
/// ```
pub struct OperatorSystem {
    pub item_client: ItemClient,
    pub store_client: StoreClient,
    pub namespace_client: ResourceClient<Namespace>,

    shutdown: watch::Sender<bool>,
    controllers: Vec<JoinHandle<()>>,
    actors: Vec<JoinHandle<()>>,
}

impl OperatorSystem {
    /// Spawns all actors and controllers. Must be called inside a Tokio runtime.
    pub fn start(config: &OperatorConfig) -> Self {
        info!(?config, "Starting operator");

        let (item_actor, items) =
            ResourceActor::<Item>::new(config.store_buffer_size, config.watch_capacity);
        let (store_actor, stores) =
            ResourceActor::<Store>::new(config.store_buffer_size, config.watch_capacity);
        let (namespace_actor, namespaces) =
            ResourceActor::<Namespace>::new(config.store_buffer_size, config.watch_capacity);

        let actors = vec![
            tokio::spawn(item_actor.run()),
            tokio::spawn(store_actor.run()),
            tokio::spawn(namespace_actor.run()),
        ];

        let (shutdown, signal) = watch::channel(false);
        let item_controller = item_controller::controller(items.clone(), &config.item_controller);
        let store_controller = store_controller::controller(
            stores.clone(),
            namespaces.clone(),
            items.clone(),
            &config.store_controller,
        );
        let controllers = vec![
            tokio::spawn(item_controller.run(signal.clone())),
            tokio::spawn(store_controller.run(signal)),
        ];

        let validator = ItemValidator::new(items.clone(), config.admission_timeout());

        Self {
            item_client: ItemClient::new(items, validator),
            store_client: StoreClient::new(stores),
            namespace_client: namespaces,
            shutdown,
            controllers,
            actors,
        }
    }

    /// Gracefully shuts down the operator.
    ///
    /// # Shutdown Process
    ///
    /// 1. Signal the controllers and wait for them. They stop their watch sources and
    ///    finish in-flight reconciles, releasing their clients.
    /// 2. Drop the remaining clients, which closes the actors' request channels.
    /// 3. Wait for every actor to drain and exit.
    ///
    /// Clones of the public clients held elsewhere keep their actor alive, so drop
    /// them before calling this.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down operator...");

        // A send error means every controller already exited.
        let _ = self.shutdown.send(true);
        for handle in self.controllers {
            if let Err(e) = handle.await {
                error!("Controller task failed: {:?}", e);
                return Err(format!("Controller task failed: {:?}", e));
            }
        }

        drop(self.item_client);
        drop(self.store_client);
        drop(self.namespace_client);

        for handle in self.actors {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Operator shutdown complete.");
        Ok(())
    }
}
