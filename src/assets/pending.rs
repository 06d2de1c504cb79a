use futures::{
    FutureExt as _,
    channel::oneshot,
    future::{BoxFuture, Shared},
};

use crate::{
    assets::raster::{RasterImage, decode_logo},
    foundation::error::{QrCardError, QrCardResult},
};

type DecodeOutput = Result<RasterImage, String>;

/// A logo bitmap that may still be decoding.
///
/// `PendingRaster` is the explicit completion signal for the one asynchronous suspension point
/// of the compositor: nothing can read pixels until it resolves. Clones observe the same
/// completion.
#[derive(Clone)]
pub struct PendingRaster {
    inner: Shared<BoxFuture<'static, DecodeOutput>>,
}

/// Completion handle for a [`PendingRaster`] created with [`PendingRaster::deferred`].
///
/// Dropping the resolver without completing it fails the pending raster instead of leaving it
/// unresolved forever.
pub struct RasterResolver {
    tx: oneshot::Sender<DecodeOutput>,
}

impl PendingRaster {
    /// An already-decoded bitmap.
    pub fn ready(image: RasterImage) -> Self {
        Self::from_output(Ok(image))
    }

    /// A raster that has already failed.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::from_output(Err(msg.into()))
    }

    /// Decode `bytes` on the rayon pool.
    pub fn decode(bytes: impl Into<Vec<u8>>) -> Self {
        let (resolver, pending) = Self::deferred();
        resolver.decode(bytes);
        pending
    }

    /// A pending raster plus the handle that completes it.
    pub fn deferred() -> (RasterResolver, Self) {
        let (tx, rx) = oneshot::channel::<DecodeOutput>();
        let fut = async move {
            match rx.await {
                Ok(out) => out,
                Err(oneshot::Canceled) => {
                    Err("logo source was dropped before it completed".to_string())
                }
            }
        };
        (
            RasterResolver { tx },
            Self {
                inner: fut.boxed().shared(),
            },
        )
    }

    /// Whether the raster has completed (successfully or not) and been observed by a poll.
    pub fn is_resolved(&self) -> bool {
        self.inner.peek().is_some()
    }

    /// Wait for completion.
    pub async fn resolve(&self) -> QrCardResult<RasterImage> {
        self.inner.clone().await.map_err(QrCardError::logo_decode)
    }

    fn from_output(out: DecodeOutput) -> Self {
        Self {
            inner: futures::future::ready(out).boxed().shared(),
        }
    }
}

impl std::fmt::Debug for PendingRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.inner.peek() {
            None => "pending",
            Some(Ok(_)) => "ready",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("PendingRaster").field("state", &state).finish()
    }
}

impl RasterResolver {
    /// Complete with a decoded bitmap.
    pub fn resolve(self, image: RasterImage) {
        self.send(Ok(image));
    }

    /// Complete with a failure.
    pub fn fail(self, msg: impl Into<String>) {
        self.send(Err(msg.into()));
    }

    /// Decode `bytes` on the rayon pool and complete with the result.
    pub fn decode(self, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        rayon::spawn(move || {
            let out = decode_logo(&bytes).map_err(|e| e.to_string());
            self.send(out);
        });
    }

    fn send(self, out: DecodeOutput) {
        if self.tx.send(out).is_err() {
            tracing::debug!("logo completion arrived after every waiter was dropped");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/pending.rs"]
mod tests;
