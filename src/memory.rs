use std::error;
use std::fmt;

pub mod parse;

pub type Byte = u8; // 1 byte

/// Memory size used when none is given
pub const DEFAULT_MEMORY_SIZE: usize = 16;

/// The program counter is a single byte, so memory can't be any larger
pub const MAX_MEMORY_SIZE: usize = 256;

/// Bytes shown per row of a memory dump
const DUMP_ROW_LEN: usize = 4;

/// Errors creating memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    InvalidSize { size: usize },
    ImageTooLarge { len: usize, size: usize },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::InvalidSize { size } => write!(
                f,
                "memory size `{}` is not between 1 and {}",
                size, MAX_MEMORY_SIZE
            ),
            MemoryError::ImageTooLarge { len, size } => write!(
                f,
                "image of {} bytes does not fit into {} bytes of memory",
                len, size
            ),
        }
    }
}

impl error::Error for MemoryError {}

/// An access to an address the memory doesn't have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressError {
    pub address: usize,
    pub size: usize,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "memory has no address `0x{:x}` (size is {})",
            self.address, self.size
        )
    }
}

impl error::Error for AddressError {}

pub type Result<T, E = MemoryError> = std::result::Result<T, E>;

/// Emulates memory for use with the CPU. Holds both instructions and data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memory {
    /// The actual data of the memory, always zero initialized
    data: Vec<Byte>,
}

impl Default for Memory {
    /// Initializes [`DEFAULT_MEMORY_SIZE`] bytes of memory
    fn default() -> Self {
        Memory {
            data: vec![0; DEFAULT_MEMORY_SIZE],
        }
    }
}

impl Memory {
    /// Initializes `size` bytes of zeroed memory
    ///
    /// # Errors
    ///
    /// Fails if `size` is zero or larger than [`MAX_MEMORY_SIZE`].
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 || size > MAX_MEMORY_SIZE {
            return Err(MemoryError::InvalidSize { size });
        }

        Ok(Memory {
            data: vec![0; size],
        })
    }

    /// Loads a binary image into `size` bytes of memory. Bytes after the
    /// image are zero.
    pub fn from_image(image: &[Byte], size: usize) -> Result<Self> {
        let mut memory = Self::new(size)?;
        if image.len() > size {
            return Err(MemoryError::ImageTooLarge {
                len: image.len(),
                size,
            });
        }
        memory.data[..image.len()].copy_from_slice(image);

        Ok(memory)
    }

    /// Number of addressable bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<Byte> {
        self.data
    }

    /// Reads a byte from the memory
    pub fn read_byte(&self, position: usize) -> Result<Byte, AddressError> {
        self.data
            .get(position)
            .copied()
            .ok_or_else(|| self.out_of_bounds(position))
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: usize, value: Byte) -> Result<(), AddressError> {
        let err = self.out_of_bounds(position);
        let cell = self.data.get_mut(position).ok_or(err)?;
        *cell = value;

        Ok(())
    }

    /// Writes an array of bytes to the memory
    pub fn write_array(&mut self, position: usize, data: &[Byte]) -> Result<(), AddressError> {
        let end = position + data.len();
        if end > self.len() {
            return Err(self.out_of_bounds(end - 1));
        }
        self.data[position..end].copy_from_slice(data);

        Ok(())
    }

    /// Renders the memory in rows of four bytes, prefixed with the address
    /// of the first byte of the row. A trailing partial row is rendered too.
    pub fn dump(&self) -> String {
        self.to_string()
    }

    fn out_of_bounds(&self, address: usize) -> AddressError {
        AddressError {
            address,
            size: self.len(),
        }
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory Dump:")?;

        for (row, bytes) in self.data.chunks(DUMP_ROW_LEN).enumerate() {
            write!(f, "\t{:02X}:", row * DUMP_ROW_LEN)?;
            for byte in bytes {
                write!(f, " {:02X}", byte)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Writes a block of instructions directly into the memory. Evaluates to the
/// [`Result`] of the write.
///
/// ```
/// use nibble::memory::Memory;
/// use nibble::write_instructions;
///
/// let mut mem = Memory::default();
/// write_instructions!(mem : 0 => LDA 5, LDB 6, ADD, OUT, HLT).unwrap();
/// assert_eq!(&mem.as_bytes()[..5], &[0x15, 0x36, 0x50, 0xF0, 0xE0]);
/// ```
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $op:ident $( $operand:literal )? ),+ $(,)? ) => {
        $mem.write_array($pos, &[
            $(
                $crate::isa::Opcode::$op.with_operand(0 $( + $operand )?),
            )+
        ])
    };
}
