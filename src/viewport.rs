//! Output size tracking.

/// Width, height and aspect of the presented image; `aspect == width / height` always holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    aspect: f32,
}

impl Viewport {
    /// Zero dimensions are clamped to 1
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            aspect: width as f32 / height as f32,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Apply a new size; returns false (keeping the previous size) for zero
    /// dimensions or an unchanged size
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == self.size() {
            return false;
        }
        *self = Self::new(width, height);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_keeps_aspect_consistent() {
        let mut viewport = Viewport::new(800, 600);
        assert!(viewport.resize(1920, 1080));
        assert_eq!(viewport.size(), (1920, 1080));
        assert_eq!(viewport.aspect(), 1920.0 / 1080.0);
    }

    #[test]
    fn test_zero_resize_is_rejected() {
        let mut viewport = Viewport::new(800, 600);
        assert!(!viewport.resize(0, 600));
        assert!(!viewport.resize(800, 0));
        assert_eq!(viewport.size(), (800, 600));
        assert!(viewport.aspect().is_finite());
    }
}
