//! Packed rotation byte <-> signed permutation matrix.
//!
//! Transform frames store their rotation as a decimal string of one byte:
//!
//! ```text
//! bit | meaning
//! 0-1 | column of the non-zero entry in row 0
//! 2-3 | column of the non-zero entry in row 1
//! 4   | sign of row 0 (0 : +1, 1 : -1)
//! 5   | sign of row 1
//! 6   | sign of row 2
//! ```
//!
//! Row 2's column is whichever column rows 0 and 1 do not use.
//!
//! For example
//!
//! ```text
//!  0  1  0
//!  0  0 -1   =>  (1 << 0) | (2 << 2) | (0 << 4) | (1 << 5) | (1 << 6) = 0x69
//! -1  0  0
//! ```

use std::fmt;
use std::ops::Mul;

use crate::util::{Error, IVec3, Mat3, Result};

/// Row-major signed permutation matrix.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rotation([[i8; 3]; 3]);

impl Rotation {
    /// The identity rotation (byte `0x04`).
    pub const IDENTITY: Self = Self([[1, 0, 0], [0, 1, 0], [0, 0, 1]]);

    /// Decode a packed rotation byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        let invalid = || Error::InvalidRotationByte { byte, node_id: None };

        // Bit 7 is never produced by an encoder; accepting it would break re-encoding.
        if byte & 0x80 != 0 {
            return Err(invalid());
        }
        let col0 = (byte & 0x03) as usize;
        let col1 = ((byte >> 2) & 0x03) as usize;
        if col0 > 2 || col1 > 2 || col0 == col1 {
            return Err(invalid());
        }
        let col2 = 3 - col0 - col1;

        let sign = |bit: u8| if byte & (1 << bit) == 0 { 1 } else { -1 };
        let mut m = [[0i8; 3]; 3];
        m[0][col0] = sign(4);
        m[1][col1] = sign(5);
        m[2][col2] = sign(6);
        Ok(Self(m))
    }

    /// Validate and wrap a matrix.
    pub fn from_matrix(matrix: [[i8; 3]; 3]) -> Result<Self> {
        let mut column_used = [false; 3];
        for row in &matrix {
            let mut nonzero = row.iter().enumerate().filter(|(_, v)| **v != 0);
            let (col, value) = match (nonzero.next(), nonzero.next()) {
                (Some((col, value)), None) => (col, *value),
                _ => return Err(Error::InvalidRotationMatrix(matrix)),
            };
            if value.abs() != 1 || column_used[col] {
                return Err(Error::InvalidRotationMatrix(matrix));
            }
            column_used[col] = true;
        }
        Ok(Self(matrix))
    }

    /// Encode to the packed byte form.
    pub fn to_byte(&self) -> u8 {
        let mut byte = self.column(0) | (self.column(1) << 2);
        for row in 0..3 {
            if self.0[row][self.column(row) as usize] < 0 {
                byte |= 1 << (4 + row);
            }
        }
        byte
    }

    fn column(&self, row: usize) -> u8 {
        // A validated row has exactly one non-zero entry.
        self.0[row].iter().position(|v| *v != 0).unwrap_or(0) as u8
    }

    /// Row-major matrix entries.
    #[inline]
    pub fn matrix(&self) -> [[i8; 3]; 3] {
        self.0
    }

    /// Check if this is the identity rotation.
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Convert to a glam matrix (glam is column-major).
    pub fn to_mat3(&self) -> Mat3 {
        let m = self.0;
        Mat3::from_cols_array_2d(&[
            [m[0][0] as f32, m[1][0] as f32, m[2][0] as f32],
            [m[0][1] as f32, m[1][1] as f32, m[2][1] as f32],
            [m[0][2] as f32, m[1][2] as f32, m[2][2] as f32],
        ])
    }

    /// Rotate an integer vector. `None` when a negated component is `i32::MIN`.
    pub fn checked_transform(&self, v: IVec3) -> Option<IVec3> {
        let src = v.to_array();
        let mut out = [0i32; 3];
        for (row, slot) in self.0.iter().zip(out.iter_mut()) {
            let col = row.iter().position(|&e| e != 0)?;
            *slot = if row[col] < 0 { src[col].checked_neg()? } else { src[col] };
        }
        Some(IVec3::from_array(out))
    }

    /// Apply `self` first, then `next`. Same as `next * self`.
    pub fn then(self, next: Rotation) -> Rotation {
        next * self
    }

    /// Inverse rotation (the transpose).
    pub fn inverse(&self) -> Self {
        let m = self.0;
        Self([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Rotation {
    type Output = Rotation;

    /// Matrix product; the result of two signed permutations is one as well.
    fn mul(self, rhs: Rotation) -> Rotation {
        let mut out = [[0i8; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[r][k] * rhs.0[k][c]).sum();
            }
        }
        Rotation(out)
    }
}

impl TryFrom<[[i8; 3]; 3]> for Rotation {
    type Error = Error;

    fn try_from(matrix: [[i8; 3]; 3]) -> Result<Self> {
        Self::from_matrix(matrix)
    }
}

impl fmt::Debug for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rotation({:?})", self.0)
    }
}

/// Decode a packed rotation byte.
pub fn decode_rotation(byte: u8) -> Result<Rotation> {
    Rotation::from_byte(byte)
}

/// Encode a signed permutation matrix into its packed byte.
pub fn encode_rotation(matrix: [[i8; 3]; 3]) -> Result<u8> {
    Rotation::from_matrix(matrix).map(|r| r.to_byte())
}
