use ndarray::{Array2, CowArray, Ix2};

use crate::Idx2d;

/// 单个通道的二维数组. 保留原始元素类型, 持久化时按类型原样写入.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    /// 掩码.
    Bool(Array2<bool>),

    /// 8-bit 灰度影像.
    U8(Array2<u8>),

    /// 16-bit 灰度影像 (多数 MRI 原始像素).
    U16(Array2<u16>),

    /// 有符号 16-bit 影像.
    I16(Array2<i16>),

    /// 单精度浮点影像 (nifti 读取结果).
    F32(Array2<f32>),

    /// 双精度浮点影像 (线性重标定结果).
    F64(Array2<f64>),
}

/// [`ChannelData`] 的元素类型标签.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ElemKind {
    /// `bool`
    Bool,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `i16`
    I16,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

impl ElemKind {
    /// 所有类型.
    pub const ALL: [ElemKind; 6] = [
        Self::Bool,
        Self::U8,
        Self::U16,
        Self::I16,
        Self::F32,
        Self::F64,
    ];

    /// 持久化元数据中使用的类型标签.
    #[inline]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// 从类型标签解析. 未知标签返回 `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// 对所有变体执行相同的表达式.
macro_rules! each_variant {
    ($value: expr, $arr: ident => $body: expr) => {
        match $value {
            ChannelData::Bool($arr) => $body,
            ChannelData::U8($arr) => $body,
            ChannelData::U16($arr) => $body,
            ChannelData::I16($arr) => $body,
            ChannelData::F32($arr) => $body,
            ChannelData::F64($arr) => $body,
        }
    };
}

macro_rules! impl_from_array {
    ($($elem: ty => $variant: ident),+) => {
        $(
            impl From<Array2<$elem>> for ChannelData {
                #[inline]
                fn from(value: Array2<$elem>) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_from_array!(
    bool => Bool,
    u8 => U8,
    u16 => U16,
    i16 => I16,
    f32 => F32,
    f64 => F64
);

impl ChannelData {
    /// 数组形状 `(height, width)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        each_variant!(self, a => a.dim())
    }

    /// 元素类型.
    #[inline]
    pub fn elem_kind(&self) -> ElemKind {
        match self {
            Self::Bool(_) => ElemKind::Bool,
            Self::U8(_) => ElemKind::U8,
            Self::U16(_) => ElemKind::U16,
            Self::I16(_) => ElemKind::I16,
            Self::F32(_) => ElemKind::F32,
            Self::F64(_) => ElemKind::F64,
        }
    }

    /// 若为掩码则返回其引用.
    #[inline]
    pub fn as_mask(&self) -> Option<&Array2<bool>> {
        match self {
            Self::Bool(m) => Some(m),
            _ => None,
        }
    }

    /// 非零像素掩码. 掩码通道直接借用, 不复制.
    pub fn nonzero(&self) -> CowArray<'_, bool, Ix2> {
        match self {
            Self::Bool(m) => m.view().into(),
            Self::U8(a) => a.mapv(|v| v != 0).into(),
            Self::U16(a) => a.mapv(|v| v != 0).into(),
            Self::I16(a) => a.mapv(|v| v != 0).into(),
            Self::F32(a) => a.mapv(|v| v != 0.0).into(),
            Self::F64(a) => a.mapv(|v| v != 0.0).into(),
        }
    }

    /// 转换为 `f32` 数组, 掩码映射为 0.0 / 1.0.
    pub fn to_f32(&self) -> Array2<f32> {
        match self {
            Self::Bool(m) => m.mapv(|v| if v { 1.0 } else { 0.0 }),
            Self::U8(a) => a.mapv(f32::from),
            Self::U16(a) => a.mapv(f32::from),
            Self::I16(a) => a.mapv(f32::from),
            Self::F32(a) => a.clone(),
            Self::F64(a) => a.mapv(|v| v as f32),
        }
    }

    /// 计算 `value * slope + intercept`, 结果为 `f64`.
    pub fn rescale(&self, slope: f64, intercept: f64) -> Array2<f64> {
        let f = |v: f64| v * slope + intercept;
        match self {
            Self::Bool(m) => m.mapv(|v| f(u8::from(v) as f64)),
            Self::U8(a) => a.mapv(|v| f(v.into())),
            Self::U16(a) => a.mapv(|v| f(v.into())),
            Self::I16(a) => a.mapv(|v| f(v.into())),
            Self::F32(a) => a.mapv(|v| f(v.into())),
            Self::F64(a) => a.mapv(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelData, ElemKind};
    use ndarray::array;

    #[test]
    fn test_elem_kind_tag() {
        for kind in ElemKind::ALL {
            assert_eq!(ElemKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ElemKind::from_tag("complex64"), None);
    }

    #[test]
    fn test_nonzero_and_to_f32() {
        let c = ChannelData::from(array![[0i16, -3], [7, 0]]);
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c.elem_kind(), ElemKind::I16);
        assert_eq!(c.nonzero(), array![[false, true], [true, false]]);
        assert_eq!(c.to_f32(), array![[0.0f32, -3.0], [7.0, 0.0]]);
        assert!(c.as_mask().is_none());

        let m = ChannelData::from(array![[true, false]]);
        assert_eq!(m.to_f32(), array![[1.0f32, 0.0]]);
        assert!(m.as_mask().is_some());
    }

    #[test]
    fn test_rescale() {
        let c = ChannelData::from(array![[0u16, 10], [20, 30]]);
        assert_eq!(
            c.rescale(2.0, -1024.0),
            array![[-1024.0, -1004.0], [-984.0, -964.0]]
        );
    }
}
