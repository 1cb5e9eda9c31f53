use std::{io, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    io::AsyncWriteExt,
    sync::{Mutex, MutexGuard},
    time::{sleep, timeout},
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Serial connection to the motor controller.
///
/// Writes go through a single-writer guard, a caller that holds [`LinkGuard`] owns the
/// actuator until it drops it.
pub struct HardwareLink {
    name: String,
    transport: Mutex<Box<dyn Transport>>,
    write_timeout: Duration,
}

pub struct LinkGuard<'a> {
    transport: MutexGuard<'a, Box<dyn Transport>>,
    write_timeout: Duration,
}

/// Byte sink that carries movement payloads to the controller.
#[async_trait]
pub trait Transport: Send {
    /// Writes the whole payload and flushes it.
    async fn send(&mut self, payload: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("Failed to open {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("Write failed: {0}")]
    Write(#[from] io::Error),

    #[error("Write timed out after {0:?}")]
    Timeout(Duration),
}

impl HardwareLink {
    const IO_TIMEOUT: Duration = Duration::from_secs(1);
    const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

    /// Opens the serial port and waits `settle` for the controller to come out of reset.
    pub async fn open(port: &str, baud_rate: u32, settle: Duration) -> Result<Self, HardwareError> {
        let stream = tokio_serial::new(port, baud_rate)
            .timeout(Self::IO_TIMEOUT)
            .open_native_async()
            .map_err(|source| HardwareError::Connection {
                port: port.to_owned(),
                source,
            })?;

        tracing::debug!("Opened {port}, waiting {settle:?} for the controller");
        sleep(settle).await;

        Ok(Self::new(port, stream))
    }

    pub fn new(name: impl Into<String>, transport: impl Transport + 'static) -> Self {
        Self {
            name: name.into(),
            transport: Mutex::new(Box::new(transport)),
            write_timeout: Self::WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for exclusive access to the actuator.
    pub async fn lock(&self) -> LinkGuard<'_> {
        LinkGuard {
            transport: self.transport.lock().await,
            write_timeout: self.write_timeout,
        }
    }

    pub async fn write(&self, payload: &[u8]) -> Result<(), HardwareError> {
        self.lock().await.write(payload).await
    }
}

impl LinkGuard<'_> {
    pub async fn write(&mut self, payload: &[u8]) -> Result<(), HardwareError> {
        timeout(self.write_timeout, self.transport.send(payload))
            .await
            .map_err(|_| HardwareError::Timeout(self.write_timeout))??;

        Ok(())
    }
}

#[async_trait]
impl Transport for SerialStream {
    async fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.write_all(payload).await?;
        self.flush().await
    }
}
