use bytes::Bytes;

const SIZE_U32: usize = 4;

pub struct PayloadCursor {
    data: Bytes,
    offset: usize,
}

impl PayloadCursor {
    pub fn new(data: Bytes) -> Self {
        Self { data, offset: 0 }
    }

    pub fn has_remaining(&self, len: usize) -> bool {
        self.offset + len <= self.data.len()
    }

    pub fn read_u32(&mut self) -> Result<u32, String> {
        if !self.has_remaining(SIZE_U32) {
            return Err("Payload too short for u32".to_string());
        }
        let mut raw = [0u8; SIZE_U32];
        raw.copy_from_slice(&self.data[self.offset..self.offset + SIZE_U32]);
        self.offset += SIZE_U32;
        Ok(u32::from_be_bytes(raw))
    }

    pub fn read_string(&mut self) -> Result<String, String> {
        let len = self.read_u32()? as usize;
        if !self.has_remaining(len) {
            return Err(format!("Incomplete string: expected {} bytes", len));
        }
        let s = std::str::from_utf8(&self.data[self.offset..self.offset + len])
            .map_err(|e| format!("Invalid UTF-8 in string: {}", e))?;
        self.offset += len;
        Ok(s.to_string())
    }

    pub fn read_remaining(&mut self) -> Bytes {
        let b = self.data.slice(self.offset..);
        self.offset = self.data.len();
        b
    }
}
