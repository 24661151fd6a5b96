//! ATU page table and ring buffer programming.
//!
//! The DMA engine does not see physical memory directly. It writes into a
//! device window starting at [`MEM_WINDOW_START`](map::MEM_WINDOW_START), and
//! the ATU translates each 4 KiB page of that window through a page table held
//! in the scratch registers: entry `n` is the pair
//! `(ACP_SCRATCH_REG_0 + 8n, ACP_SCRATCH_REG_0 + 8n + 4)` holding the low word
//! and the high word tagged with bit 31.

use embedded_hal::delay::DelayNs;
use log::debug;

use super::AcpHardware;
use crate::buffer::DmaRegion;
use crate::constants::PAGE_BYTES;
use crate::error::{Error, Result};
use crate::regs::{map, Registers};

/// Walk `region` segment by segment and call `page` with the physical address
/// of every ATU page it covers. Returns the number of pages.
///
/// The region offset advances by each segment's own length. Segments must
/// start page aligned, and only the last one may end part way through a
/// page.
fn walk_pages<F>(region: &dyn DmaRegion, mut page: F) -> Result<u32>
where
    F: FnMut(u32, u64),
{
    let total = region.len();
    let mut offset = 0u32;
    let mut index = 0u32;

    while offset < total {
        let segment = region.segment(offset).ok_or(Error::InvalidSegment { offset })?;
        if segment.len == 0 || segment.addr % u64::from(PAGE_BYTES) != 0 {
            return Err(Error::InvalidSegment { offset });
        }
        let consumed = segment.len.min(total - offset);
        // Every page but the region's last is mapped in full.
        if consumed < total - offset && consumed % PAGE_BYTES != 0 {
            return Err(Error::InvalidSegment { offset });
        }

        let mut covered = 0u32;
        while covered < consumed {
            if index >= map::SCRATCH_DESCRIPTOR_PAIRS {
                return Err(Error::TooManySegments);
            }
            page(index, segment.addr + u64::from(covered));
            index += 1;
            covered = covered.saturating_add(PAGE_BYTES);
        }
        offset += consumed;
    }
    Ok(index)
}

impl<R, D> AcpHardware<R, D>
where
    R: Registers,
    D: DelayNs,
{
    /// Enable ATU group 1 and write one page-table entry per 4 KiB page of
    /// `region`, starting at scratch slot 0.
    ///
    /// The region is validated before any entry is written, so a rejected
    /// region leaves the previous table intact.
    pub fn configure_descriptors(&mut self, region: &dyn DmaRegion) -> Result<u32> {
        self.regs.write32(
            map::ACP_SRAM_PTE_OFFSET | map::ATU_VALID,
            map::ACP_AXI2AXI_ATU_BASE_ADDR_GRP_1,
        );
        self.regs
            .write32(map::ACP_PAGE_SIZE_4K_ENABLE, map::ACP_AXI2AXI_ATU_PAGE_SIZE_GRP_1);

        walk_pages(region, |_, _| {})?;

        let regs = &self.regs;
        let pages = walk_pages(region, |index, addr| {
            let slot = map::ACP_SCRATCH_REG_0 + index * 8;
            regs.write32(addr as u32, slot);
            regs.write32((addr >> 32) as u32 | map::ATU_VALID, slot + 4);
        })?;

        debug!("acp-pdm: {pages} ATU page entries for {} bytes", region.len());
        Ok(pages)
    }

    /// Read back page-table entry `index`, without the valid tag.
    ///
    /// Returns `None` for an entry that is not marked valid.
    pub fn read_descriptor(&self, index: u32) -> Option<u64> {
        if index >= map::SCRATCH_DESCRIPTOR_PAIRS {
            return None;
        }
        let slot = map::ACP_SCRATCH_REG_0 + index * 8;
        let low = self.regs.read32(slot);
        let high = self.regs.read32(slot + 4);
        if high & map::ATU_VALID == 0 {
            return None;
        }
        Some((u64::from(high & !map::ATU_VALID) << 32) | u64::from(low))
    }

    /// Program the PDM receive ring and enable address translation.
    ///
    /// `addr` is the device-side address of the ring (normally
    /// [`MEM_WINDOW_START`](map::MEM_WINDOW_START)). The ATU enable goes last:
    /// it activates translation through the table programmed above.
    pub fn init_ring_buffer(&mut self, addr: u32, buffer_bytes: u32, watermark_bytes: u32) {
        self.regs.write32(addr, map::ACP_WOV_RX_RINGBUFADDR);
        self.regs.write32(buffer_bytes, map::ACP_WOV_RX_RINGBUFSIZE);
        self.regs
            .write32(watermark_bytes, map::ACP_WOV_RX_INTR_WATERMARK_SIZE);
        self.regs.write32(0x1, map::ACP_AXI2AXI_ATU_CTRL);
    }
}
