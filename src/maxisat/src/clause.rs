/**************************************************************************************[clause.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
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

use {
    crate::{
        alloc::{self, RegionAllocator},
        intmap::{AsIndex, IntMap, IntMapBool, IntSet},
    },
    std::{fmt, iter::DoubleEndedIterator, ops, slice, u32},
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var(u32);

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}", self.0 + 1)
        }
    }
}

impl Var {
    pub const UNDEF: Var = Var(!0);
    #[inline(always)]
    pub(crate) fn from_idx(idx: u32) -> Self {
        debug_assert!(idx < u32::MAX / 2, "Var::from_idx: index too large");
        Var(idx)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }

    /// Make a variable from the index. This should only be used
    /// with integers obtained from an existing `v.idx()`
    #[inline]
    pub fn unsafe_from_idx(idx: u32) -> Self {
        Var::from_idx(idx)
    }
}

impl AsIndex for Var {
    fn as_index(self) -> usize {
        self.0 as usize
    }
    fn from_index(index: usize) -> Self {
        Var(index as u32)
    }
}

pub type VMap<V> = IntMap<Var, V>;

/// A literal: `2 * var` for the positive literal, `2 * var + 1` for its negation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Lit(u32);

impl Lit {
    pub const UNDEF: Lit = Lit(!1);
    pub const ERROR: Lit = Lit(!0);

    #[inline(always)]
    pub fn new(var: Var, sign: bool) -> Self {
        Lit(var.0 * 2 + (!sign) as u32)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
    #[inline(always)]
    pub fn sign(&self) -> bool {
        (self.0 & 1) == 0
    }
    #[inline(always)]
    pub fn var(&self) -> Var {
        Var(self.0 >> 1)
    }

    /// `lit.apply_sign(b)` keeps the same sign if `b==true`, flips sign otherwise
    #[inline(always)]
    pub fn apply_sign(&self, sign: bool) -> Lit {
        if sign {
            *self
        } else {
            !*self
        }
    }

    /// DIMACS integer for this literal (variables are numbered from 1).
    pub fn to_dimacs(&self) -> i32 {
        let v = self.var().idx() as i32 + 1;
        if self.sign() {
            v
        } else {
            -v
        }
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "ERROR")
        } else if self.0 == !1 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}{:?}", if self.sign() { "" } else { "-" }, self.var())
        }
    }
}

impl ops::Not for Lit {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Lit(self.0 ^ 1)
    }
}
impl ops::BitXor<bool> for Lit {
    type Output = Self;
    fn bitxor(self, rhs: bool) -> Self {
        Lit(self.0 ^ rhs as u32)
    }
}

impl AsIndex for Lit {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Lit(index as u32)
    }
}

pub type LMap<V> = IntMap<Lit, V>;
pub type LSet = IntSet<Lit>;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
/// A ternary boolean (true, false, undefined) used for partial assignments.
pub struct lbool(u8);

impl fmt::Debug for lbool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "TRUE")
        } else if self.0 == 1 {
            write!(f, "FALSE")
        } else if self.0 <= 3 {
            write!(f, "UNDEF")
        } else {
            write!(f, "lbool({})", self.0)
        }
    }
}
impl Default for lbool {
    fn default() -> Self {
        lbool::UNDEF
    }
}

impl lbool {
    pub const TRUE: lbool = lbool(0);
    pub const FALSE: lbool = lbool(1);
    pub const UNDEF: lbool = lbool(2);
    pub fn from_u8(v: u8) -> Self {
        debug_assert!(v == (v & 3), "lbool::from_u8: invalid value");
        lbool(v)
    }
    #[inline(always)]
    pub fn new(v: bool) -> Self {
        lbool((!v) as u8)
    }
}

// from minisat:
// bool operator == (lbool b) const { return ((b.value&2) & (value&2)) | (!(b.value&2)&(value == b.value)); }
impl PartialEq for lbool {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0 || (self.0 & rhs.0 & 2) != 0
    }
}

impl Eq for lbool {}

impl ops::Neg for lbool {
    type Output = lbool;

    /// Negation of a `lbool`
    fn neg(self) -> Self {
        lbool(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for lbool {
    type Output = lbool;

    /// Xor of a lbool with a boolean.
    fn bitxor(self, rhs: bool) -> Self {
        lbool(self.0 ^ rhs as u8)
    }
}

impl From<bool> for lbool {
    fn from(x: bool) -> Self {
        if x {
            lbool::TRUE
        } else {
            lbool::FALSE
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// A reference to some clause
pub(crate) struct ClauseRef<'a> {
    header: ClauseHeader,
    data: &'a [ClauseData],
    extra: &'a [ClauseData],
}
#[derive(Debug)]
/// A mutable reference to some clause, with a temporary lifetime
pub(crate) struct ClauseMut<'a> {
    header: &'a mut ClauseHeader,
    data: &'a mut [ClauseData],
    extra: &'a mut [ClauseData],
}

// slots of the extra region
const EXTRA_ACTIVITY: usize = 0;
const EXTRA_LBD: usize = 1;
const EXTRA_STATE: usize = 2;
const EXTRA_WATCHED: usize = 0;

impl<'a> ClauseRef<'a> {
    #[inline(always)]
    pub fn mark(&self) -> u32 {
        self.header.mark()
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        self.header.learnt()
    }
    #[inline(always)]
    pub fn at_most(&self) -> bool {
        self.header.at_most()
    }
    #[inline(always)]
    pub fn can_be_del(&self) -> bool {
        self.header.can_be_del()
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.header.size()
    }
    #[inline(always)]
    pub fn activity(&self) -> f32 {
        debug_assert!(self.learnt());
        unsafe { self.extra[EXTRA_ACTIVITY].f32 }
    }
    #[inline(always)]
    pub fn lbd(&self) -> u32 {
        debug_assert!(self.learnt());
        unsafe { self.extra[EXTRA_LBD].u32 }
    }
    /// Id of the solver state this clause was learnt in.
    #[inline(always)]
    pub fn learnt_on_state(&self) -> u32 {
        debug_assert!(self.learnt());
        unsafe { self.extra[EXTRA_STATE].u32 }
    }
    /// Number of watched literals of an at-most-k clause, i.e. `size - k + 1`.
    #[inline(always)]
    pub fn watched(&self) -> u32 {
        debug_assert!(self.at_most());
        unsafe { self.extra[EXTRA_WATCHED].u32 }
    }
    #[inline(always)]
    pub fn lits(&self) -> &'a [Lit] {
        let ptr = self.data.as_ptr() as *const ClauseData as *const Lit;
        unsafe { slice::from_raw_parts(ptr, self.data.len()) }
    }
    #[inline(always)]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a Lit> {
        self.lits().iter()
    }
}

/// Anything that can be considered as a list of literals.
///
/// We use `Into` to have more flexibility for `ClauseRef`, which contains
/// a slice of a `union` type rather than pure literals
pub trait ClauseIterable: fmt::Debug {
    type Item: Copy + Into<Lit>;
    fn items(&self) -> &[Self::Item];
}

/// Any iterable clause can be printed in DIMACS
impl<T: ClauseIterable> display::Print for T {
    // display as DIMACS
    fn fmt_dimacs(&self, out: &mut fmt::Formatter) -> fmt::Result {
        for &x in self.items().iter() {
            let lit: Lit = x.into();
            write!(out, "{} ", lit.to_dimacs())?;
        }
        write!(out, "0")?;
        Ok(())
    }
}

impl<'a> ClauseIterable for ClauseRef<'a> {
    type Item = Lit;
    fn items(&self) -> &[Self::Item] {
        self.lits()
    }
}

impl<'a> ClauseIterable for &'a [Lit] {
    type Item = Lit;
    fn items(&self) -> &[Self::Item] {
        &self
    }
}

impl ClauseIterable for Vec<Lit> {
    type Item = Lit;
    fn items(self: &Vec<Lit>) -> &[Self::Item] {
        &self
    }
}

impl ClauseIterable for IntSet<Lit> {
    type Item = Lit;
    fn items(&self) -> &[Self::Item] {
        self.as_slice()
    }
}

impl<'a> ClauseMut<'a> {
    #[inline(always)]
    pub fn reloced(&self) -> bool {
        self.header.reloced()
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.data.len() as u32
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        self.header.learnt()
    }
    #[inline(always)]
    pub fn set_mark(&mut self, mark: u32) {
        debug_assert!(mark < 4);
        self.header.set_mark(mark);
    }
    #[inline(always)]
    pub fn set_can_be_del(&mut self, b: bool) {
        self.header.set_can_be_del(b);
    }
    #[inline(always)]
    pub fn set_reloced(&mut self, reloced: bool) {
        self.header.set_reloced(reloced);
    }
    #[inline(always)]
    pub fn activity(&self) -> f32 {
        debug_assert!(self.learnt());
        unsafe { self.extra[EXTRA_ACTIVITY].f32 }
    }
    #[inline(always)]
    pub fn set_activity(&mut self, activity: f32) {
        debug_assert!(self.learnt());
        self.extra[EXTRA_ACTIVITY].f32 = activity;
    }
    #[inline(always)]
    pub fn set_lbd(&mut self, lbd: u32) {
        debug_assert!(self.learnt());
        self.extra[EXTRA_LBD].u32 = lbd;
    }
    #[inline(always)]
    pub fn set_learnt_on_state(&mut self, state: u32) {
        debug_assert!(self.learnt());
        self.extra[EXTRA_STATE].u32 = state;
    }
    #[inline(always)]
    pub fn set_watched(&mut self, watched: u32) {
        debug_assert!(self.header.at_most());
        self.extra[EXTRA_WATCHED].u32 = watched;
    }
    #[inline(always)]
    pub fn swap(&mut self, i: u32, j: u32) {
        self.data.swap(i as usize, j as usize)
    }
    pub fn relocation(&self) -> CRef {
        debug_assert!(self.reloced());
        unsafe { self.data[0].cref }
    }
    pub fn relocate(mut self, c: CRef) {
        debug_assert!(!self.reloced());
        self.set_reloced(true);
        self.data[0].cref = c;
    }
    pub fn as_clause_ref(&mut self) -> ClauseRef {
        ClauseRef {
            header: *self.header,
            data: self.data,
            extra: self.extra,
        }
    }
}

impl<'a> ops::Index<u32> for ClauseRef<'a> {
    type Output = Lit;
    #[inline(always)]
    fn index(&self, index: u32) -> &Self::Output {
        unsafe { &self.data[index as usize].lit }
    }
}
impl<'a> ops::Index<u32> for ClauseMut<'a> {
    type Output = Lit;
    #[inline(always)]
    fn index(&self, index: u32) -> &Self::Output {
        unsafe { &self.data[index as usize].lit }
    }
}
impl<'a> ops::IndexMut<u32> for ClauseMut<'a> {
    #[inline(always)]
    fn index_mut(&mut self, index: u32) -> &mut Self::Output {
        unsafe { &mut self.data[index as usize].lit }
    }
}

#[derive(Debug)]
/// Main clause allocator. It stores a set of clauses efficiently.
pub struct ClauseAllocator {
    ra: RegionAllocator<ClauseData>,
}

#[repr(C)]
#[derive(Clone, Copy)]
/// Items used in the clause allocator. It should be compact enough that
/// we do no waste space.
pub(crate) union ClauseData {
    u32: u32,
    f32: f32,
    cref: CRef,
    header: ClauseHeader,
    lit: Lit,
}

impl Into<Lit> for ClauseData {
    fn into(self: ClauseData) -> Lit {
        unsafe { self.lit }
    }
}

impl Default for ClauseData {
    fn default() -> Self {
        ClauseData { u32: 0 }
    }
}
impl fmt::Debug for ClauseData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ClauseData({})", unsafe { self.u32 })
    }
}

/// Metadata of a clause
///
/// Layout:
/// unsigned mark       : 2;
/// unsigned learnt     : 1;
/// unsigned at_most    : 1;
/// unsigned can_be_del : 1;
/// unsigned reloced    : 1;
/// unsigned size       : 26;
///
/// Learnt clauses are followed by 3 extra slots (activity, LBD, state id),
/// at-most-k clauses by 1 (number of watched literals).
#[derive(Clone, Copy)]
pub struct ClauseHeader(u32);

impl fmt::Debug for ClauseHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClauseHeader")
            .field("mark", &self.mark())
            .field("learnt", &self.learnt())
            .field("at_most", &self.at_most())
            .field("can_be_del", &self.can_be_del())
            .field("reloced", &self.reloced())
            .field("size", &self.size())
            .finish()
    }
}

const SIZE_BITS: u32 = 26;

impl ClauseHeader {
    pub fn new(learnt: bool, at_most: bool, size: u32) -> Self {
        debug_assert!(size < (1 << SIZE_BITS));
        ClauseHeader(((learnt as u32) << 29) | ((at_most as u32) << 28) | (1 << 27) | size)
    }
    #[inline(always)]
    pub fn mark(&self) -> u32 {
        self.0 >> 30
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        (self.0 & (1 << 29)) != 0
    }
    #[inline(always)]
    pub fn at_most(&self) -> bool {
        (self.0 & (1 << 28)) != 0
    }
    #[inline(always)]
    pub fn can_be_del(&self) -> bool {
        (self.0 & (1 << 27)) != 0
    }
    #[inline(always)]
    pub fn reloced(&self) -> bool {
        (self.0 & (1 << 26)) != 0
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.0 & ((1 << SIZE_BITS) - 1)
    }
    #[inline(always)]
    fn extra_len(&self) -> u32 {
        if self.learnt() {
            3
        } else if self.at_most() {
            1
        } else {
            0
        }
    }
    pub fn set_mark(&mut self, mark: u32) {
        debug_assert!(mark < 4);
        self.0 = (self.0 & !(3 << 30)) | (mark << 30);
    }
    pub fn set_can_be_del(&mut self, b: bool) {
        self.0 = (self.0 & !(1 << 27)) | ((b as u32) << 27);
    }
    pub fn set_reloced(&mut self, reloced: bool) {
        self.0 = (self.0 & !(1 << 26)) | ((reloced as u32) << 26);
    }
}

impl ClauseAllocator {
    pub fn with_start_cap(start_cap: u32) -> Self {
        Self {
            ra: RegionAllocator::new(start_cap),
        }
    }
    pub fn new() -> Self {
        Self::with_start_cap(1024 * 1024)
    }
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.ra.len()
    }
    pub fn wasted(&self) -> u32 {
        self.ra.wasted()
    }

    fn alloc_raw(&mut self, clause: &[Lit], header: ClauseHeader) -> CRef {
        let extra = header.extra_len();
        let cid = self.ra.alloc(1 + clause.len() as u32 + extra);
        self.ra[cid].header = header;
        let clause_ptr = cid + 1;
        for (i, &lit) in clause.iter().enumerate() {
            self.ra[clause_ptr + i as u32].lit = lit;
        }
        cid
    }

    /// Allocate an ordinary clause. Learnt clauses start with activity 0,
    /// LBD 0 and state 0.
    pub(crate) fn alloc_with_learnt(&mut self, clause: &[Lit], learnt: bool) -> CRef {
        self.alloc_raw(clause, ClauseHeader::new(learnt, false, clause.len() as u32))
    }

    /// Allocate the at-most-`k` constraint over `clause`.
    pub(crate) fn alloc_at_most(&mut self, clause: &[Lit], k: u32) -> CRef {
        debug_assert!((k as usize) < clause.len());
        let cid = self.alloc_raw(clause, ClauseHeader::new(false, true, clause.len() as u32));
        let watched = clause.len() as u32 - k + 1;
        self.get_mut(cid).set_watched(watched);
        cid
    }

    pub(crate) fn alloc_copy(&mut self, from: ClauseRef) -> CRef {
        let cid = self.alloc_raw(from.lits(), from.header);
        let extra_ptr = cid + 1 + from.size();
        for (i, &e) in from.extra.iter().enumerate() {
            self.ra[extra_ptr + i as u32] = e;
        }
        cid
    }

    pub(crate) fn free(&mut self, cr: CRef) {
        let size = {
            let h = unsafe { self.ra[cr].header };
            1 + h.size() + h.extra_len()
        };
        self.ra.free(size);
    }

    /// Forget every clause allocated at or after offset `len`.
    pub(crate) fn truncate(&mut self, len: u32) {
        self.ra.truncate(len)
    }

    /// Relocate clause `cr` into allocator `to`.
    ///
    /// post condition: `*cr` now contains the index of the copy in `to`
    pub(crate) fn reloc(&mut self, cr: &mut CRef, to: &mut ClauseAllocator) {
        let mut c = self.get_mut(*cr);

        if c.reloced() {
            *cr = c.relocation();
            return;
        }

        *cr = to.alloc_copy(c.as_clause_ref());
        c.relocate(*cr);
    }

    /// Get a reference on the clause `cr` points to
    pub(crate) fn get_ref<'a>(&'a self, cr: CRef) -> ClauseRef<'a> {
        let header = unsafe { self.ra[cr].header };
        let size = header.size();

        let data = self.ra.subslice(cr + 1, size);
        let extra = self.ra.subslice(cr + 1 + size, header.extra_len());
        ClauseRef {
            header,
            data,
            extra,
        }
    }

    /// Get a mutable reference on the clause `cr` points to
    pub(crate) fn get_mut(&mut self, cr: CRef) -> ClauseMut {
        let header = unsafe { self.ra[cr].header };
        let size = header.size();
        let len = 1 + size + header.extra_len();

        let subslice = self.ra.subslice_mut(cr, len);
        let (subslice0, subslice) = subslice.split_at_mut(1);
        let (subslice1, subslice2) = subslice.split_at_mut(size as usize);
        ClauseMut {
            header: unsafe { &mut subslice0[0].header },
            data: subslice1,
            extra: subslice2,
        }
    }
}

pub(crate) type CRef = alloc::Ref<ClauseData>;

/// Predicate that decides whether a value `V` is deleted or not
pub trait DeletePred<V> {
    fn deleted(&self, v: &V) -> bool;
}

pub type OccVec<V> = Vec<V>;

#[derive(Debug, Clone)]
/// List of occurrences of objects of type `K` (e.g. literals) in values
/// of type `V` (e.g. clauses)
pub struct OccListsData<K: AsIndex, V> {
    occs: IntMap<K, OccVec<V>>,
    dirty: IntMapBool<K>,
    dirties: Vec<K>, // to know what keys to examine in `clean_all_pred`
}

impl<K: AsIndex, V> OccListsData<K, V> {
    pub fn new() -> Self {
        Self {
            occs: IntMap::new(),
            dirty: IntMapBool::new(),
            dirties: Vec::new(),
        }
    }

    /// Initialize occurrence list for the given `idx`
    pub fn init(&mut self, idx: K) {
        self.occs.reserve_default(idx);
        self.occs[idx].clear();
        self.dirty.reserve(idx);
    }

    /// Number of keys with an occurrence list.
    pub fn len(&self) -> usize {
        self.occs.len()
    }

    /// `oclist.lookup_mut_pred(idx, p)` returns an up-to-date list of occurrences
    /// for `idx`. It will clean up the occurrence list with `p` if it's dirty.
    pub fn lookup_mut_pred<P: DeletePred<V>>(&mut self, idx: K, pred: &P) -> &mut OccVec<V> {
        if self.dirty[idx] {
            self.clean_pred(idx, pred);
        }
        &mut self.occs[idx]
    }

    /// Cleanup entries marked as `dirty` (remove elements for which the predicate
    /// specifies they're deleted)
    pub fn clean_all_pred<P: DeletePred<V>>(&mut self, pred: &P) {
        for &x in &self.dirties {
            // Dirties may contain duplicates so check here if a variable is already cleaned:
            if self.dirty.has(x) && self.dirty[x] {
                self.occs[x].retain(|x| !pred.deleted(x));
                self.dirty.set(x, false);
            }
        }
        self.dirties.clear();
    }

    /// Cleanup entry at `idx`
    pub fn clean_pred<P: DeletePred<V>>(&mut self, idx: K, pred: &P) {
        self.occs[idx].retain(|x| !pred.deleted(x));
        self.dirty.set(idx, false);
    }

    /// Mark index `K` as dirty, so it can be cleaned up later
    pub fn smudge(&mut self, idx: K) {
        if !self.dirty[idx] {
            self.dirty.insert(idx);
            self.dirties.push(idx);
        }
    }

    /// Drop the occurrence lists of every key `>= len`.
    pub fn truncate(&mut self, len: usize) {
        self.occs.truncate(len);
        self.dirty.truncate(len);
        self.dirties.retain(|k| k.as_index() < len);
    }

    /// Apply `f` to every stored value, e.g. to relocate clause handles.
    pub fn map_in_place<F: FnMut(&mut V)>(&mut self, mut f: F) {
        for (_, occ) in self.occs.iter_mut() {
            occ.iter_mut().for_each(&mut f);
        }
    }
}

impl<K: AsIndex, V> ops::Index<K> for OccListsData<K, V> {
    type Output = OccVec<V>;
    fn index(&self, index: K) -> &Self::Output {
        &self.occs[index]
    }
}
impl<K: AsIndex, V> ops::IndexMut<K> for OccListsData<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        &mut self.occs[index]
    }
}

/// Generic interface for objects printable in DIMACS
pub mod display {
    use std::fmt;

    /// Objects that can be printed in DIMACS syntax
    pub trait Print: Sized {
        fn fmt_dimacs(&self, out: &mut fmt::Formatter) -> fmt::Result;

        /// Any type implementing `T` can  be used in a format string by
        /// just using `x.pp_dimacs()` instead of `x`.
        ///
        /// ```
        /// use maxisat::*;
        /// let v: Vec<Lit> = vec![];
        /// format!("as dimacs: {}", v.pp_dimacs());
        /// ```
        fn pp_dimacs(&self) -> PrintWrapper<Self> {
            PrintWrapper(&self)
        }
    }

    /// A wrapper that can be used to display objects in format strings
    pub struct PrintWrapper<'a, T: 'a + Print>(&'a T);

    // Whenever `T` is printable in DIMACS, its wrapper implements Display
    impl<'a, T: Print> fmt::Display for PrintWrapper<'a, T> {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            self.0.fmt_dimacs(out)
        }
    }
}

#[cfg(test)]
mod test {
    use super::display::Print;
    use super::*;

    /// test that ClauseData doesn't waste space
    #[test]
    fn test_size_clause_data() {
        use std::mem;
        assert_eq!(mem::size_of::<super::ClauseData>(), 4);
    }

    #[test]
    fn test_eq() {
        for i in 0..4 {
            let a = lbool::from_u8(i);
            for j in 0..4 {
                let b = lbool::from_u8(j);
                let are_eq = (i == 0 && j == 0) || (i == 1 && j == 1) || (i >= 2 && j >= 2);
                assert_eq!(are_eq, a == b, "{:?}[{}] == {:?}[{}]", a, i, b, j);
            }
        }
    }

    #[test]
    fn test_not() {
        assert_eq!(-lbool::TRUE, lbool::FALSE);
        assert_eq!(-lbool::FALSE, lbool::TRUE);
        assert_eq!(-lbool::UNDEF, lbool::UNDEF);
    }

    #[test]
    fn test_bitxor() {
        assert_eq!(lbool::TRUE ^ true, lbool::FALSE);
        assert_eq!(lbool::FALSE ^ false, lbool::FALSE);
        assert_eq!(lbool::UNDEF ^ true, lbool::UNDEF);
    }

    #[test]
    fn test_lit_encoding() {
        let v = Var::from_idx(3);
        let p = Lit::new(v, true);
        assert_eq!(p.idx(), 6);
        assert_eq!((!p).idx(), 7);
        assert_eq!(p.var(), v);
        assert_eq!(p.to_dimacs(), 4);
        assert_eq!((!p).to_dimacs(), -4);
        assert_eq!(p ^ true, !p);
        assert_eq!(p.apply_sign(false), !p);
    }

    #[test]
    fn test_header_flags() {
        let mut h = ClauseHeader::new(true, false, 12);
        assert!(h.learnt());
        assert!(!h.at_most());
        assert!(h.can_be_del());
        assert_eq!(h.size(), 12);
        h.set_mark(1);
        h.set_can_be_del(false);
        h.set_reloced(true);
        assert_eq!(h.mark(), 1);
        assert!(!h.can_be_del());
        assert!(h.reloced());
        assert_eq!(h.size(), 12);
    }

    #[test]
    fn test_alloc_learnt_and_at_most() {
        let lits: Vec<Lit> = (0..4).map(|i| Lit::new(Var::from_idx(i), i % 2 == 0)).collect();
        let mut ca = ClauseAllocator::with_start_cap(64);
        let c1 = ca.alloc_with_learnt(&lits[..3], true);
        {
            let mut c = ca.get_mut(c1);
            c.set_activity(2.5);
            c.set_lbd(3);
            c.set_learnt_on_state(7);
        }
        let c2 = ca.alloc_at_most(&lits, 2);
        let c = ca.get_ref(c1);
        assert_eq!(c.lits(), &lits[..3]);
        assert_eq!(c.activity(), 2.5);
        assert_eq!(c.lbd(), 3);
        assert_eq!(c.learnt_on_state(), 7);
        let d = ca.get_ref(c2);
        assert!(d.at_most());
        assert_eq!(d.watched(), 3);
        assert_eq!(d.lits(), &lits[..]);
        assert_eq!(format!("{}", d.pp_dimacs()), "1 -2 3 -4 0");

        ca.truncate(c2.offset());
        assert_eq!(ca.len(), c2.offset());
    }

    #[test]
    fn test_reloc() {
        let lits: Vec<Lit> = (0..3).map(|i| Lit::new(Var::from_idx(i), true)).collect();
        let mut ca = ClauseAllocator::with_start_cap(64);
        let mut to = ClauseAllocator::with_start_cap(64);
        let _dead = ca.alloc_with_learnt(&lits, false);
        let c = ca.alloc_with_learnt(&lits[1..], true);
        ca.get_mut(c).set_lbd(5);
        let mut r1 = c;
        let mut r2 = c;
        ca.reloc(&mut r1, &mut to);
        ca.reloc(&mut r2, &mut to);
        assert_eq!(r1, r2);
        assert_eq!(to.get_ref(r1).lits(), &lits[1..]);
        assert_eq!(to.get_ref(r1).lbd(), 5);
    }
}
