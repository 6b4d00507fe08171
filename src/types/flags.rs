/*
    tapeflux

    Copyright 2024 The tapeflux Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    flags.rs

    Defines track consistency bitflags
*/

use bitflags::bitflags;

bitflags! {
    /// Recoverable anomalies encountered while reading a track. None of these abort a read;
    /// they are accumulated per track so that callers can decide on retry or skip policy.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[rustfmt::skip]
    pub struct TrackConsistency: u32 {
        #[doc = "A sector ID field did not start with the expected sync and ID mark bytes"]
        const BAD_ADDRESS_MARK  = 0b0000_0000_0000_0001;
        #[doc = "A sector ID field failed its CRC"]
        const BAD_ADDRESS_CRC   = 0b0000_0000_0000_0010;
        #[doc = "A data field did not start with the expected sync and data mark bytes"]
        const NO_DAM            = 0b0000_0000_0000_0100;
        #[doc = "A data field failed its CRC and its payload was discarded"]
        const BAD_DATA_CRC      = 0b0000_0000_0000_1000;
        #[doc = "A sector ID reported a track number different from the established one"]
        const TRACK_MISMATCH    = 0b0000_0000_0001_0000;
        #[doc = "A sector ID reported a side different from the established one"]
        const SIDE_MISMATCH     = 0b0000_0000_0010_0000;
        #[doc = "A sector ID carried a size code other than 1, 2 or 3"]
        const BAD_SIZE_CODE     = 0b0000_0000_0100_0000;
    }
}
