pub mod ddm;
