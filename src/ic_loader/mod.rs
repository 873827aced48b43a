/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Loading of fpga-interchange device files into a `MemDevice`.

/* Schemas are compiled by build.rs */
macro_rules! include_interchange_capnp {
    ($filename:literal) => {
        include!(concat!(env!("OUT_DIR"), "/interchange/", $filename));
    };
}

#[allow(non_snake_case, warnings)]
pub mod References_capnp {
    include_interchange_capnp!("References_capnp.rs");
}

#[allow(non_snake_case, warnings)]
pub mod DeviceResources_capnp {
    include_interchange_capnp!("DeviceResources_capnp.rs");
}

use std::path::Path;
use std::fs::File;
use std::io::BufReader;
use memmap2::Mmap;
use flate2::read::GzDecoder;

use crate::device::MemDevice;
use crate::error::DeviceError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum OpenWriteError {
    #[error("can't open device file: {0}")]
    CantOpenFile(String),
    #[error("Cap'n Proto error: {0}")]
    CapnProtoError(String),
    #[error("invalid device: {0}")]
    InvalidDevice(String),
}

impl From<capnp::Error> for OpenWriteError {
    fn from(e: capnp::Error) -> Self {
        OpenWriteError::CapnProtoError(format!("{:?}", e))
    }
}

impl From<DeviceError> for OpenWriteError {
    fn from(e: DeviceError) -> Self {
        OpenWriteError::InvalidDevice(e.to_string())
    }
}

const CPNP_MSG_MAXSIZE: usize = usize::MAX;

#[derive(Default)]
pub struct OpenOpts {
    pub raw: bool,
}

pub trait MsgReader {
    fn get_archdef_root<'a>(&'a self) -> Result<archdef::Root<'a>, capnp::Error>;
}

impl<S> MsgReader for capnp::message::Reader<S> where
    S: capnp::message::ReaderSegments
{
    fn get_archdef_root<'a>(&'a self) -> Result<archdef::Root<'a>, capnp::Error> {
        self.get_root::<archdef::Root<'a>>()
    }
}

pub fn open<P>(path: P, opts: OpenOpts) -> Result<Box<dyn MsgReader>, OpenWriteError> where
    P: AsRef<Path>,
{
    let archdef_file = File::open(path)
        .map_err(|e| OpenWriteError::CantOpenFile(format!("{:?}", e)))?;

    let reader_opts = capnp::message::ReaderOptions {
        traversal_limit_in_words: Some(CPNP_MSG_MAXSIZE),
        .. capnp::message::DEFAULT_READER_OPTIONS
    };

    /* RAW mode memory-maps an uncompressed (gunzipped) device file. It loads much
     * faster in debug builds. */
    let reader: Box<dyn MsgReader> = if opts.raw {
        /* UNSAFE DUE TO A POTENTIAL UB WHEN A FILE IS CHANGED! */
        let mmapped = unsafe { Mmap::map(&archdef_file) }
            .map_err(|e| OpenWriteError::CantOpenFile(format!("mmap failed: {:?}", e)))?;
        let segments = capnp::serialize::BufferSegments::new(mmapped, reader_opts)
            .map_err(|e| OpenWriteError::CapnProtoError(
                format!("failed to create buffer segments: {:?}", e)
            ))?;
        Box::new(capnp::message::Reader::new(segments, reader_opts))
    } else {
        let d = BufReader::new(GzDecoder::new(archdef_file));
        let reader = capnp::serialize::read_message(d, reader_opts)?;
        Box::new(reader)
    };

    Ok(reader)
}

/// Opens an fpga-interchange device file and converts it into a `MemDevice`.
pub fn load_device<P>(path: P, opts: OpenOpts) -> Result<MemDevice, OpenWriteError> where
    P: AsRef<Path>
{
    let msg = open(path, opts)?;
    let root = msg.get_archdef_root()?;
    archdef::build_device(root)
}

pub mod archdef;
