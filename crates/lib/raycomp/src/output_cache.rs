use std::sync::Arc;

use raycomp_backend::{
    access::AccessType,
    ash::vk,
    image::{Image, ImageDesc},
    BackendError, Device,
};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// Single-slot cache for the ray tracing output image.
///
/// The cached image is reused for as long as the requested extent and format match.
/// Any mismatch releases it before the replacement is allocated, so at most one
/// output image is alive at a time.
pub struct OutputImageCache {
    image: Option<Arc<Image>>,
    has_valid_contents: bool,
    last_access: AccessType,
}

impl Default for OutputImageCache {
    fn default() -> Self {
        Self {
            image: None,
            has_valid_contents: false,
            last_access: AccessType::Nothing,
        }
    }
}

impl OutputImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// An image usable for random reads and writes with exactly `extent`,
    /// or `None` if either dimension is zero.
    pub fn acquire(
        &mut self,
        device: &dyn Device,
        extent: [u32; 2],
        format: vk::Format,
    ) -> Result<Option<Arc<Image>>, BackendError> {
        if extent[0] == 0 || extent[1] == 0 {
            return Ok(None);
        }

        if let Some(image) = &self.image {
            if image.extent_2d() == extent && image.desc.format == format {
                return Ok(Some(image.clone()));
            }
        }

        self.release(device);

        debug!("Allocating ray tracing output {}x{}", extent[0], extent[1]);

        let image = Arc::new(
            device.create_image(
                ImageDesc::new_2d(format, extent).usage(
                    vk::ImageUsageFlags::STORAGE
                        | vk::ImageUsageFlags::SAMPLED
                        | vk::ImageUsageFlags::TRANSFER_SRC,
                ),
            )?,
        );

        self.image = Some(image.clone());
        Ok(Some(image))
    }

    pub fn release(&mut self, device: &dyn Device) {
        if let Some(image) = self.image.take() {
            device.release_image(&image);
        }

        self.has_valid_contents = false;
        self.last_access = AccessType::Nothing;
    }

    pub fn image(&self) -> Option<&Arc<Image>> {
        self.image.as_ref()
    }

    pub fn extent(&self) -> Option<[u32; 2]> {
        self.image.as_ref().map(|image| image.extent_2d())
    }

    /// Whether the cached image holds the result of a completed dispatch.
    pub fn has_valid_contents(&self) -> bool {
        self.has_valid_contents
    }

    pub fn mark_written(&mut self) {
        self.has_valid_contents = self.image.is_some();
    }

    /// How the cached image was last accessed by a recorded frame.
    pub fn last_access(&self) -> AccessType {
        self.last_access
    }

    pub fn set_last_access(&mut self, access_type: AccessType) {
        self.last_access = access_type;
    }
}

#[cfg(test)]
mod tests {
    use raycomp_backend::NullDevice;

    use super::*;

    const FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;

    #[test]
    fn steady_viewport_allocates_once() {
        let device = NullDevice::new();
        let mut cache = OutputImageCache::new();

        let first = cache.acquire(&device, [1920, 1080], FORMAT).unwrap().unwrap();
        for _ in 1..10 {
            let image = cache.acquire(&device, [1920, 1080], FORMAT).unwrap().unwrap();
            assert_eq!(image.raw, first.raw);
        }

        assert_eq!(device.image_allocation_count(), 1);
        assert!(first.desc.is_storage());
    }

    #[test]
    fn at_most_one_live_image_across_resizes() {
        let device = NullDevice::new();
        let mut cache = OutputImageCache::new();

        let sizes = [[640, 480], [800, 600], [800, 600], [0, 0], [1024, 768], [7, 0], [640, 480]];
        let mut last_requested = None;

        for extent in sizes {
            let image = cache.acquire(&device, extent, FORMAT).unwrap();

            if extent.contains(&0) {
                assert!(image.is_none());
            } else {
                assert_eq!(image.unwrap().extent_2d(), extent);
                last_requested = Some(extent);
            }

            assert!(device.live_image_count() <= 1);
            assert_eq!(cache.extent(), last_requested);
        }

        assert_eq!(device.image_allocation_count(), 4);
    }

    #[test]
    fn degenerate_extent_keeps_the_cached_image() {
        let device = NullDevice::new();
        let mut cache = OutputImageCache::new();

        let before = cache.acquire(&device, [320, 200], FORMAT).unwrap().unwrap();
        cache.mark_written();

        assert!(cache.acquire(&device, [0, 0], FORMAT).unwrap().is_none());
        assert!(device.is_image_live(before.raw));
        assert!(cache.has_valid_contents());

        let after = cache.acquire(&device, [320, 200], FORMAT).unwrap().unwrap();
        assert_eq!(after.raw, before.raw);
        assert_eq!(device.image_allocation_count(), 1);
    }

    #[test]
    fn reallocation_invalidates_contents() {
        let device = NullDevice::new();
        let mut cache = OutputImageCache::new();

        let before = cache.acquire(&device, [320, 200], FORMAT).unwrap().unwrap();
        cache.mark_written();
        cache.set_last_access(AccessType::TransferRead);

        let after = cache.acquire(&device, [640, 400], FORMAT).unwrap().unwrap();
        assert!(!device.is_image_live(before.raw));
        assert!(device.is_image_live(after.raw));
        assert!(!cache.has_valid_contents());
        assert_eq!(cache.last_access(), AccessType::Nothing);
    }

    #[test]
    fn format_change_reallocates() {
        let device = NullDevice::new();
        let mut cache = OutputImageCache::new();

        cache.acquire(&device, [64, 64], FORMAT).unwrap();
        let image = cache
            .acquire(&device, [64, 64], vk::Format::R8G8B8A8_UNORM)
            .unwrap()
            .unwrap();

        assert_eq!(image.desc.format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(device.live_image_count(), 1);
    }

    #[test]
    fn failed_allocation_leaves_the_cache_empty() {
        let device = NullDevice::new();
        let mut cache = OutputImageCache::new();

        cache.acquire(&device, [64, 64], FORMAT).unwrap();
        device.set_fail_allocations(true);

        assert!(cache.acquire(&device, [128, 128], FORMAT).is_err());
        assert!(cache.image().is_none());
        assert_eq!(device.live_image_count(), 0);
    }
}
