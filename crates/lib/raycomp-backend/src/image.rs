use ash::vk;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ImageType {
    Tex2d = 2,
    Cube = 5,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ImageDesc {
    pub image_type: ImageType,
    pub usage: vk::ImageUsageFlags,
    pub format: vk::Format,
    pub extent: [u32; 3],
    pub mip_levels: u16,
    pub array_elements: u32,
}

impl ImageDesc {
    pub fn new(format: vk::Format, image_type: ImageType, extent: [u32; 3]) -> Self {
        Self {
            image_type,
            usage: vk::ImageUsageFlags::default(),
            format,
            extent,
            mip_levels: 1,
            array_elements: 1,
        }
    }

    pub fn new_2d(format: vk::Format, extent: [u32; 2]) -> Self {
        let [width, height] = extent;
        Self::new(format, ImageType::Tex2d, [width, height, 1])
    }

    pub fn new_cube(format: vk::Format, width: u32) -> Self {
        Self {
            array_elements: 6,
            ..Self::new(format, ImageType::Cube, [width, width, 1])
        }
    }

    pub fn usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.usage = usage;
        self
    }

    pub fn extent_2d(&self) -> [u32; 2] {
        [self.extent[0], self.extent[1]]
    }

    /// Storage images can be bound for random read/write access from ray generation shaders.
    pub fn is_storage(&self) -> bool {
        self.usage.contains(vk::ImageUsageFlags::STORAGE)
    }

    pub fn is_empty(&self) -> bool {
        self.extent.iter().any(|&e| e == 0)
    }
}

/// Opaque device-side identity of an image. Never reused by a device within its lifetime.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageId(pub u64);

#[derive(Debug)]
pub struct Image {
    pub raw: ImageId,
    pub desc: ImageDesc,
}

impl Image {
    pub fn extent_2d(&self) -> [u32; 2] {
        self.desc.extent_2d()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_2d_extent() {
        let desc = ImageDesc::new_2d(vk::Format::R16G16B16A16_SFLOAT, [1920, 1080])
            .usage(vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::TRANSFER_SRC);

        assert_eq!(desc.extent, [1920, 1080, 1]);
        assert_eq!(desc.extent_2d(), [1920, 1080]);
        assert!(desc.is_storage());
        assert!(!desc.is_empty());
    }

    #[test]
    fn zero_sized_is_empty() {
        assert!(ImageDesc::new_2d(vk::Format::R8G8B8A8_UNORM, [0, 720]).is_empty());
        assert!(ImageDesc::new_2d(vk::Format::R8G8B8A8_UNORM, [1280, 0]).is_empty());
    }
}
