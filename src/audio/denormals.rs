//! Flush-to-zero guard for the audio thread.
//!
//! While a [`ScopedNoDenormals`] is alive, subnormal floats produced or
//! consumed by the current thread are treated as zero. The previous FPU
//! control word is restored on drop. On targets without a known control
//! register this is a no-op and the filters rely on their own state flushing.

#[cfg(target_arch = "x86_64")]
mod imp {
    use std::arch::asm;

    // MXCSR flush-to-zero (bit 15) and denormals-are-zero (bit 6).
    const FLUSH_BITS: u32 = (1 << 15) | (1 << 6);

    pub fn read() -> u32 {
        let mut csr: u32 = 0;
        // SAFETY: stmxcsr only writes the 32-bit control word into `csr`.
        unsafe {
            asm!("stmxcsr [{}]", in(reg) &mut csr, options(nostack, preserves_flags));
        }
        csr
    }

    pub fn write(csr: u32) {
        // SAFETY: loads a control word previously read from, or derived from, MXCSR.
        unsafe {
            asm!("ldmxcsr [{}]", in(reg) &csr, options(nostack, readonly, preserves_flags));
        }
    }

    pub const fn with_flush(csr: u32) -> u32 {
        csr | FLUSH_BITS
    }
}

#[cfg(target_arch = "aarch64")]
mod imp {
    use std::arch::asm;

    // FPCR flush-to-zero (bit 24).
    const FLUSH_BITS: u64 = 1 << 24;

    pub fn read() -> u64 {
        let fpcr: u64;
        // SAFETY: reading FPCR has no side effects.
        unsafe {
            asm!("mrs {}, fpcr", out(reg) fpcr, options(nomem, nostack, preserves_flags));
        }
        fpcr
    }

    pub fn write(fpcr: u64) {
        // SAFETY: writes back a value previously read from, or derived from, FPCR.
        unsafe {
            asm!("msr fpcr, {}", in(reg) fpcr, options(nomem, nostack, preserves_flags));
        }
    }

    pub const fn with_flush(fpcr: u64) -> u64 {
        fpcr | FLUSH_BITS
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
mod imp {
    pub const fn read() -> u32 {
        0
    }

    pub const fn write(_: u32) {}

    pub const fn with_flush(word: u32) -> u32 {
        word
    }
}

/// RAII guard enabling flush-to-zero for the current thread.
///
/// Must be dropped on the thread that created it.
pub struct ScopedNoDenormals {
    previous: ControlWord,
    // Not Send: the control register is per-thread.
    _not_send: std::marker::PhantomData<*const ()>,
}

#[cfg(target_arch = "aarch64")]
type ControlWord = u64;
#[cfg(not(target_arch = "aarch64"))]
type ControlWord = u32;

impl ScopedNoDenormals {
    #[inline]
    pub fn new() -> Self {
        let previous = imp::read();
        imp::write(imp::with_flush(previous));
        Self {
            previous,
            _not_send: std::marker::PhantomData,
        }
    }
}

impl Default for ScopedNoDenormals {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopedNoDenormals {
    #[inline]
    fn drop(&mut self) {
        imp::write(self.previous);
    }
}
