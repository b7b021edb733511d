//! The registry facade: register local services and query discovered ones.
//!
//! Owns the shared [`RegistrationStore`] and the three background loops
//! (listener, resend, cleanup). Loops stop when [`ApiRegistry::shutdown`] is
//! called or the registry is dropped.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use beacon_core::config::{BeaconConfig, TimingConfig};
use beacon_services::{Api, OwnedApi, Ownership, RegistrationStore};

use crate::channel::{self, MulticastChannel};
use crate::cleanup::cleanup_loop;
use crate::error::RegistryError;
use crate::listener::listener_loop;
use crate::resend::{announce, resend_loop};

pub struct ApiRegistry {
    store: Arc<RegistrationStore>,
    channel: MulticastChannel,
    timing: TimingConfig,
    shutdown_tx: broadcast::Sender<()>,
    /// Taken by the first call to [`ApiRegistry::shutdown`].
    tasks: Mutex<Option<LoopTasks>>,
}

struct LoopTasks {
    listener: JoinHandle<Result<()>>,
    resend: JoinHandle<()>,
    cleanup: JoinHandle<()>,
}

impl ApiRegistry {
    /// Join the configured multicast group and start the background loops.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &BeaconConfig) -> Result<Self> {
        let socket = channel::bind_listener(&config.network)
            .context("failed to create multicast listener socket")?;
        let channel = MulticastChannel::from_config(&config.network);
        Self::with_socket(socket, channel, config.timing.clone())
    }

    /// Start the background loops on a caller-supplied receive socket and channel.
    pub fn with_socket(
        socket: std::net::UdpSocket,
        channel: MulticastChannel,
        timing: TimingConfig,
    ) -> Result<Self> {
        socket.set_nonblocking(true).context("set_nonblocking")?;
        let socket = UdpSocket::from_std(socket).context("failed to convert to tokio UdpSocket")?;

        let store = Arc::new(RegistrationStore::new());
        let (shutdown_tx, _) = broadcast::channel(1);

        let listener = tokio::spawn(listener_loop(
            store.clone(),
            socket,
            shutdown_tx.subscribe(),
        ));
        let resend = tokio::spawn(resend_loop(
            store.clone(),
            channel.clone(),
            timing.clone(),
            shutdown_tx.subscribe(),
        ));
        let cleanup = tokio::spawn(cleanup_loop(
            store.clone(),
            timing.clone(),
            shutdown_tx.subscribe(),
        ));

        tracing::info!(
            target_addr = %channel.target(),
            lifespan_secs = timing.lifespan_secs,
            "api registry started"
        );

        Ok(Self {
            store,
            channel,
            timing,
            shutdown_tx,
            tasks: Mutex::new(Some(LoopTasks {
                listener,
                resend,
                cleanup,
            })),
        })
    }

    /// Advertise a local service.
    ///
    /// Idempotent per name: once a name is owned, further calls succeed
    /// without sending, whatever the version or port. Ownership is recorded
    /// only after the first announcement was sent, so a failed call can be
    /// retried.
    pub async fn register_api(&self, name: &str, version: &str, port: u16) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::InvalidArgument("name is required"));
        }
        if version.is_empty() {
            return Err(RegistryError::InvalidArgument("version is required"));
        }
        if self.store.owns(name).await {
            tracing::debug!(name, "already registered");
            return Ok(());
        }

        announce(&self.channel, name, version, port, self.timing.lifespan())?;

        match self.store.own_api(name, version, port).await {
            Ownership::Claimed => tracing::info!(name, version, port, "registered api"),
            Ownership::AlreadyOwned => {
                tracing::debug!(name, version, "registered concurrently, keeping first owner")
            }
        }
        Ok(())
    }

    /// Every currently active remote registration.
    pub async fn get_available_apis(&self) -> Vec<Api> {
        self.store.all_active().await
    }

    /// Currently active remote registrations for one name.
    pub async fn get_apis_by_name(&self, name: &str) -> Vec<Api> {
        self.store.active_by_name(name).await
    }

    /// Services this process advertises.
    pub async fn owned_apis(&self) -> Vec<OwnedApi> {
        self.store.owned_apis().await
    }

    pub fn store(&self) -> &Arc<RegistrationStore> {
        &self.store
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn channel(&self) -> &MulticastChannel {
        &self.channel
    }

    /// True once the listener has ended, which only happens on shutdown or a
    /// fatal socket error.
    pub async fn listener_finished(&self) -> bool {
        match self.tasks.lock().await.as_ref() {
            Some(tasks) => tasks.listener.is_finished(),
            None => true,
        }
    }

    /// Stop every background loop and wait for them to finish.
    ///
    /// Later calls return immediately.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        let Some(tasks) = self.tasks.lock().await.take() else {
            return;
        };

        match tasks.listener.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "listener ended with error"),
            Err(e) => tracing::error!(error = %e, "listener task failed"),
        }
        if let Err(e) = tasks.resend.await {
            tracing::error!(error = %e, "resend task failed");
        }
        if let Err(e) = tasks.cleanup.await {
            tracing::error!(error = %e, "cleanup task failed");
        }
        tracing::info!("api registry stopped");
    }
}
