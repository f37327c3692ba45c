//! Contract deployment data attached to a message.
//!
//! ```text
//! _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
//!   code:(Maybe ^Cell) data:(Maybe ^Cell)
//!   library:(HashmapE 256 SimpleLib) = StateInit;
//! tick_tock$_ tick:Bool tock:Bool = TickTock;
//! ```
//!
//! Wallets attach one to their very first outgoing request, which deploys
//! the wallet contract.

use super::MessageError;
use crate::cell::{CellBuilder, CellRef, CellSlice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickTock {
    pub tick: bool,
    pub tock: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateInit {
    pub split_depth: Option<u8>,
    pub special: Option<TickTock>,
    pub code: Option<CellRef>,
    pub data: Option<CellRef>,
    pub library: Option<CellRef>,
}

impl StateInit {
    pub(crate) fn to_builder(&self) -> Result<CellBuilder, MessageError> {
        let mut b = CellBuilder::new();
        match self.split_depth {
            Some(depth) => {
                b.store_bit(true)?.store_uint(depth as u64, 5)?;
            }
            None => {
                b.store_bit(false)?;
            }
        }
        match self.special {
            Some(tt) => {
                b.store_bit(true)?.store_bit(tt.tick)?.store_bit(tt.tock)?;
            }
            None => {
                b.store_bit(false)?;
            }
        }
        b.store_maybe_ref(self.code.clone())?
            .store_maybe_ref(self.data.clone())?
            .store_maybe_ref(self.library.clone())?;
        Ok(b)
    }

    pub(crate) fn load(slice: &mut CellSlice<'_>) -> Result<Self, MessageError> {
        let split_depth = if slice.load_bit()? {
            Some(slice.load_uint(5)? as u8)
        } else {
            None
        };
        let special = if slice.load_bit()? {
            Some(TickTock {
                tick: slice.load_bit()?,
                tock: slice.load_bit()?,
            })
        } else {
            None
        };
        Ok(Self {
            split_depth,
            special,
            code: slice.load_maybe_ref()?,
            data: slice.load_maybe_ref()?,
            library: slice.load_maybe_ref()?,
        })
    }
}
