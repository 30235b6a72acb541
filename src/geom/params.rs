//! Runtime parameter sets and parameter expressions
//!
//! A shape tree is built once; everything that varies per entity per tick
//! (offsets, angles, colours, enable switches) is read from a [`Parameters`]
//! set through typed [`Param`] keys.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::flags::ShapeFlag;
use crate::math::{FVec2, Fixed};

/// RGBA colour, components in [0, 1]
pub type Colour = glam::Vec4;

/// Value stored in one parameter slot
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Fixed(Fixed),
    Vec(FVec2),
    Colour(Colour),
    Bool(bool),
    Int(u32),
    Flag(ShapeFlag),
}

/// Types that can live in a parameter slot
pub trait ParamType: Copy + Default + 'static {
    fn wrap(self) -> ParamValue;
    fn unwrap(value: &ParamValue) -> Option<Self>;

    /// Value read from the arbitrary set: the widest the type can mean
    fn arbitrary() -> Self {
        Self::default()
    }
}

macro_rules! param_type {
    ($ty:ty, $variant:ident $(, $arbitrary:expr)?) => {
        impl ParamType for $ty {
            fn wrap(self) -> ParamValue {
                ParamValue::$variant(self)
            }

            fn unwrap(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            $(
                fn arbitrary() -> Self {
                    $arbitrary
                }
            )?
        }

        impl From<$ty> for Expr<$ty> {
            fn from(value: $ty) -> Self {
                Expr::Const(value)
            }
        }
    };
}

param_type!(Fixed, Fixed);
param_type!(FVec2, Vec);
param_type!(Colour, Colour);
param_type!(bool, Bool);
param_type!(u32, Int);
param_type!(ShapeFlag, Flag, ShapeFlag::ALL);

/// Typed key into a [`Parameters`] set
pub struct Param<T> {
    slot: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Param<T> {
    pub const fn new(slot: usize) -> Self {
        Self {
            slot,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn slot(self) -> usize {
        self.slot
    }
}

impl<T> Clone for Param<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Param<T> {}

impl<T> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Param({})", self.slot)
    }
}

/// Parameter values for one resolve.
///
/// Missing or mistyped slots read as the type's default. The *arbitrary* set
/// stands for every possible value at once: reads yield
/// [`ParamType::arbitrary`] (all flags for [`ShapeFlag`], the default
/// otherwise) and conditional nodes descend into all of their branches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    values: Vec<Option<ParamValue>>,
    arbitrary: bool,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arbitrary() -> Self {
        Self {
            values: Vec::new(),
            arbitrary: true,
        }
    }

    #[inline]
    pub fn is_arbitrary(&self) -> bool {
        self.arbitrary
    }

    pub fn set<T: ParamType>(&mut self, param: Param<T>, value: T) -> &mut Self {
        if self.values.len() <= param.slot {
            self.values.resize(param.slot + 1, None);
        }
        self.values[param.slot] = Some(value.wrap());
        self
    }

    pub fn get<T: ParamType>(&self, param: Param<T>) -> T {
        if self.arbitrary {
            return T::arbitrary();
        }
        self.values
            .get(param.slot)
            .and_then(|v| v.as_ref())
            .and_then(T::unwrap)
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// A value read at resolve time
pub enum Expr<T> {
    Const(T),
    Param(Param<T>),
    Compute(Rc<dyn Fn(&Parameters) -> T>),
}

impl<T: ParamType> Expr<T> {
    pub fn compute(f: impl Fn(&Parameters) -> T + 'static) -> Self {
        Self::Compute(Rc::new(f))
    }

    pub fn eval(&self, params: &Parameters) -> T {
        match self {
            Self::Const(v) => *v,
            Self::Param(p) => params.get(*p),
            Self::Compute(f) => {
                if params.is_arbitrary() {
                    T::arbitrary()
                } else {
                    f(params)
                }
            }
        }
    }
}

impl<T: Copy> Clone for Expr<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Const(v) => Self::Const(*v),
            Self::Param(p) => Self::Param(*p),
            Self::Compute(f) => Self::Compute(f.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => write!(f, "Const({v:?})"),
            Self::Param(p) => write!(f, "{p:?}"),
            Self::Compute(_) => write!(f, "Compute"),
        }
    }
}

impl<T> From<Param<T>> for Expr<T> {
    fn from(param: Param<T>) -> Self {
        Expr::Param(param)
    }
}

impl From<i32> for Expr<Fixed> {
    fn from(value: i32) -> Self {
        Expr::Const(Fixed::from_int(value))
    }
}
