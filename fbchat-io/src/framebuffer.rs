//! Linux framebuffer device: screen info ioctls and the shared mapping.

use fbchat_core::surface::{BYTES_PER_PIXEL, PixelSurface, SurfaceError, SurfaceGeometry};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_DEVICE: &str = "/dev/fb0";

/// A surface backed by the mapped framebuffer.
pub type FramebufferSurface = PixelSurface<MmapMut>;

#[derive(Debug, Error)]
pub enum FramebufferError {
    #[error("failed to open framebuffer {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("FBIOGET_FSCREENINFO failed: {0}")]
    FixedInfo(#[source] nix::Error),
    #[error("FBIOGET_VSCREENINFO failed: {0}")]
    VariableInfo(#[source] nix::Error),
    #[error("unsupported depth of {0} bits per pixel, only 32 is supported")]
    BitsPerPixel(u32),
    #[error("failed to map framebuffer memory: {0}")]
    Map(#[source] std::io::Error),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

/// `struct fb_var_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbVarScreeninfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbFixScreeninfo {
    pub id: [u8; 16],
    pub smem_start: libc::c_ulong,
    pub smem_len: u32,
    pub kind: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

nix::ioctl_read_bad!(fbioget_vscreeninfo, 0x4600, FbVarScreeninfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, 0x4602, FbFixScreeninfo);

/// Surface geometry from the device's screen info. Only 32bpp is accepted.
pub fn geometry_from(
    fix: &FbFixScreeninfo,
    var: &FbVarScreeninfo,
) -> Result<SurfaceGeometry, FramebufferError> {
    if var.bits_per_pixel as usize != BYTES_PER_PIXEL * 8 {
        return Err(FramebufferError::BitsPerPixel(var.bits_per_pixel));
    }
    Ok(SurfaceGeometry {
        width: var.xres as usize,
        height: var.yres as usize,
        stride: fix.line_length as usize,
        x_origin: var.xoffset as usize,
        y_origin: var.yoffset as usize,
    })
}

/// Maps `len` bytes of `file` read/write and shared.
pub fn map(file: &File, len: usize) -> Result<MmapMut, FramebufferError> {
    // SAFETY: the mapping is only accessed through the returned MmapMut; the
    // device memory stays valid for as long as the mapping exists.
    unsafe { MmapOptions::new().len(len).map_mut(file) }.map_err(FramebufferError::Map)
}

/// An open framebuffer device and its screen info.
pub struct Framebuffer {
    file: File,
    path: PathBuf,
    fix: FbFixScreeninfo,
    var: FbVarScreeninfo,
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("path", &self.path)
            .field("xres", &self.var.xres)
            .field("yres", &self.var.yres)
            .field("line_length", &self.fix.line_length)
            .finish()
    }
}

impl Framebuffer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FramebufferError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| FramebufferError::Open {
                path: path.clone(),
                source,
            })?;

        let mut fix = FbFixScreeninfo::default();
        let mut var = FbVarScreeninfo::default();
        // SAFETY: both structs match the kernel layout and outlive the calls.
        unsafe {
            fbioget_fscreeninfo(file.as_raw_fd(), &mut fix).map_err(FramebufferError::FixedInfo)?;
            fbioget_vscreeninfo(file.as_raw_fd(), &mut var).map_err(FramebufferError::VariableInfo)?;
        }

        info!(
            path = %path.display(),
            xres = var.xres,
            yres = var.yres,
            bpp = var.bits_per_pixel,
            line_length = fix.line_length,
            "framebuffer opened"
        );
        Ok(Self { file, path, fix, var })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn geometry(&self) -> Result<SurfaceGeometry, FramebufferError> {
        geometry_from(&self.fix, &self.var)
    }

    /// Length of the device memory to map.
    pub fn mapped_len(&self) -> usize {
        self.fix.smem_len as usize
    }

    /// Maps the device memory and wraps it in a pixel surface.
    pub fn into_surface(self) -> Result<FramebufferSurface, FramebufferError> {
        let geometry = self.geometry()?;
        let mem = map(&self.file, self.mapped_len())?;
        Ok(PixelSurface::new(mem, geometry)?)
    }
}
