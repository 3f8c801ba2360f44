/***************************************************************************************[alloc.rs]
Copyright (c) 2008-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use std::cmp;
use std::fmt;
use std::marker::PhantomData;
use std::ops;

/// Bump allocator for fixed-size items. Slots are never reused: freeing only
/// accounts for waste, and the whole region can be compacted or truncated.
#[derive(Debug)]
pub struct RegionAllocator<T: Copy> {
    vec: Vec<T>,
    wasted: usize,
}

impl<T: Copy + Default> RegionAllocator<T> {
    pub fn new(start_cap: u32) -> Self {
        Self {
            vec: Vec::with_capacity(start_cap as usize),
            wasted: 0,
        }
    }
    pub fn len(&self) -> u32 {
        self.vec.len() as u32
    }
    pub fn wasted(&self) -> u32 {
        self.wasted as u32
    }
    pub fn alloc(&mut self, size: u32) -> Ref<T> {
        debug_assert!(size > 0);
        let r = Ref(self.vec.len() as u32, PhantomData);
        self.vec.extend((0..size).map(|_| T::default()));
        r
    }
    pub fn free(&mut self, size: u32) {
        self.wasted += size as usize;
    }

    /// Drop every slot at or after offset `len`.
    ///
    /// The waste counter is clamped, so it may overestimate afterwards.
    pub fn truncate(&mut self, len: u32) {
        if len < self.len() {
            self.vec.truncate(len as usize);
            self.wasted = cmp::min(self.wasted, self.vec.len());
        }
    }
    pub fn subslice(&self, r: Ref<T>, len: u32) -> &[T] {
        &self.vec[r.0 as usize..r.0 as usize + len as usize]
    }
    pub fn subslice_mut(&mut self, r: Ref<T>, len: u32) -> &mut [T] {
        &mut self.vec[r.0 as usize..r.0 as usize + len as usize]
    }
}

impl<T: Copy> ops::Index<Ref<T>> for RegionAllocator<T> {
    type Output = T;
    fn index(&self, index: Ref<T>) -> &Self::Output {
        &self.vec[index.0 as usize]
    }
}
impl<T: Copy> ops::IndexMut<Ref<T>> for RegionAllocator<T> {
    fn index_mut(&mut self, index: Ref<T>) -> &mut Self::Output {
        &mut self.vec[index.0 as usize]
    }
}

#[derive(Clone, Copy, Hash)]
/// A stable handle on a `T` value living in the allocator.
///
/// Two handles are equal iff they designate the same slot, regardless of
/// what is stored there.
pub struct Ref<T: Copy>(u32, PhantomData<fn(T) -> T>);

impl<T: Copy> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "Ref(UNDEF)")
        } else {
            f.debug_tuple("Ref").field(&self.0).finish()
        }
    }
}
impl<T: Copy> PartialEq for Ref<T> {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0
    }
}
impl<T: Copy> Eq for Ref<T> {}
impl<T: Copy> PartialOrd for Ref<T> {
    fn partial_cmp(&self, rhs: &Self) -> Option<cmp::Ordering> {
        PartialOrd::partial_cmp(&self.0, &rhs.0)
    }
}
impl<T: Copy> Ord for Ref<T> {
    #[inline(always)]
    fn cmp(&self, rhs: &Self) -> cmp::Ordering {
        Ord::cmp(&self.0, &rhs.0)
    }
}
impl<T: Copy> Default for Ref<T> {
    fn default() -> Self {
        Ref::UNDEF
    }
}

impl<T: Copy> Ref<T> {
    pub const UNDEF: Self = Ref(!0, PhantomData);

    /// Offset of the handle in its region.
    #[inline(always)]
    pub fn offset(&self) -> u32 {
        self.0
    }
}

impl<T: Copy> ops::Add<u32> for Ref<T> {
    type Output = Ref<T>;
    fn add(self, rhs: u32) -> Self::Output {
        Ref(self.0 + rhs, PhantomData)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_alloc_truncate() {
        let mut ra: RegionAllocator<u32> = RegionAllocator::new(16);
        let a = ra.alloc(3);
        let b = ra.alloc(2);
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 3);
        ra[b] = 42;
        ra.free(3);
        assert_eq!(ra.wasted(), 3);
        ra.truncate(3);
        assert_eq!(ra.len(), 3);
        let c = ra.alloc(1);
        assert_eq!(c, b);
        assert_eq!(ra[c], 0);
    }

    #[test]
    fn test_ref_undef() {
        let r: Ref<u32> = Ref::default();
        assert_eq!(r, Ref::UNDEF);
        assert_eq!(format!("{:?}", r), "Ref(UNDEF)");
    }
}
