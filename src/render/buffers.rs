//! Two equally sized ARGB32 buffers carved out of one shared region.

use std::io;

use crate::runtime::shm::ShmRegion;

#[derive(Debug)]
pub struct BufferPair {
    region: ShmRegion,
    width: u32,
    height: u32,
}

impl BufferPair {
    /// Wraps `region`, which must hold at least `2 * width * height` pixels.
    pub fn new(region: ShmRegion, width: u32, height: u32) -> io::Result<Self> {
        let needed = 2 * width as usize * height as usize;
        if width == 0 || height == 0 || region.as_slice().len() < needed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("buffer region too small for two {width}x{height} frames"),
            ));
        }
        Ok(Self { region, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn buffer(&self, index: usize) -> &[u32] {
        let len = self.frame_len();
        &self.region.as_slice()[index * len..(index + 1) * len]
    }

    pub fn buffer_mut(&mut self, index: usize) -> &mut [u32] {
        let len = self.frame_len();
        &mut self.region.as_mut_slice()[index * len..(index + 1) * len]
    }

    /// Copies every pixel of buffer `from` into the other buffer.
    pub fn copy_from(&mut self, from: usize) {
        let len = self.frame_len();
        let src = from * len;
        let dst = (from ^ 1) * len;
        self.region.as_mut_slice().copy_within(src..src + len, dst);
    }

    pub fn region(&self) -> &ShmRegion {
        &self.region
    }
}

#[cfg(test)]
mod tests {
    use super::BufferPair;
    use crate::runtime::shm::ShmRegion;

    #[test]
    fn buffers_are_disjoint_halves() {
        let mut pair = BufferPair::new(ShmRegion::heap(2 * 6), 3, 2).expect("pair");
        pair.buffer_mut(0).fill(1);
        assert!(pair.buffer(1).iter().all(|&px| px == 0));
        pair.copy_from(0);
        assert_eq!(pair.buffer(0), pair.buffer(1));
    }

    #[test]
    fn rejects_short_region() {
        assert!(BufferPair::new(ShmRegion::heap(11), 3, 2).is_err());
        assert!(BufferPair::new(ShmRegion::heap(12), 0, 2).is_err());
    }
}
