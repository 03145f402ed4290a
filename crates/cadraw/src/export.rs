//! Drawing serializers.

pub mod dxf;
