// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host capabilities for turning media elements into pixels.
//!
//! The frame pump never touches pixels itself. It asks a [`FrameHost`]
//! for a bitmap of the element and, when that fails, for a raster surface
//! it can draw the element into and snapshot instead.

use ardent_core::MediaElement;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// An immutable RGBA8 image.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub pixels: Arc<[u8]>,
}

impl Bitmap {
    /// Wraps `pixels` as a `width` x `height` image.
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// A fully transparent image.
    pub fn blank(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 4;
        Self::new(width, height, vec![0u8; len])
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// An offscreen surface an element can be drawn into.
pub trait RasterSurface: Send + Sync {
    /// Current dimensions.
    fn size(&self) -> (u32, u32);

    /// Resets every pixel.
    fn clear(&mut self);

    /// Draws `element` scaled to `width` x `height` at the origin.
    fn draw_element(
        &mut self,
        element: &dyn MediaElement,
        width: u32,
        height: u32,
    ) -> anyhow::Result<()>;
}

/// Bitmap and surface services offered by the host media layer.
///
/// Every capability defaults to unsupported.
#[async_trait]
pub trait FrameHost: Send + Sync + 'static {
    /// Whether the host can produce bitmaps at all.
    fn supports_bitmaps(&self) -> bool {
        false
    }

    /// Captures the element's current frame directly.
    async fn bitmap_from_element(&self, _element: &dyn MediaElement) -> anyhow::Result<Bitmap> {
        anyhow::bail!("bitmap capture from elements is not supported by this host")
    }

    /// Creates an offscreen surface, or `None` if the host has none.
    fn create_surface(&self, _width: u32, _height: u32) -> Option<Box<dyn RasterSurface>> {
        None
    }

    /// Snapshots a surface into a bitmap.
    async fn bitmap_from_surface(&self, _surface: &dyn RasterSurface) -> anyhow::Result<Bitmap> {
        anyhow::bail!("bitmap capture from surfaces is not supported by this host")
    }
}

/// A host with no bitmap or surface support.
///
/// Frame pumps running on it publish dimension-only frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

impl FrameHost for HeadlessHost {}
