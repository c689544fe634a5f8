pub mod category;
pub mod customer;
pub mod employee;
pub mod order;
pub mod product;
pub mod shipment;
pub mod supplier;
pub mod user;

pub use category::CategoryForm;
pub use category::CategorySort;
pub use category::Entity as Categories;
pub use category::Manager as CategoryMgr;
pub use category::Model as Category;
pub use customer::CustomerForm;
pub use customer::CustomerSort;
pub use customer::Entity as Customers;
pub use customer::Manager as CustomerMgr;
pub use customer::Model as Customer;
pub use employee::EmployeeForm;
pub use employee::EmployeeSort;
pub use employee::Entity as Employees;
pub use employee::Manager as EmployeeMgr;
pub use employee::Model as Employee;
pub use order::Entity as Orders;
pub use order::Manager as OrderMgr;
pub use order::Model as Order;
pub use order::OrderForm;
pub use order::OrderSort;
pub use product::Entity as Products;
pub use product::Manager as ProductMgr;
pub use product::Model as Product;
pub use product::ProductForm;
pub use product::ProductSort;
pub use shipment::Entity as Shipments;
pub use shipment::Manager as ShipmentMgr;
pub use shipment::Model as Shipment;
pub use shipment::ShipmentForm;
pub use shipment::ShipmentSort;
pub use supplier::Entity as Suppliers;
pub use supplier::Manager as SupplierMgr;
pub use supplier::Model as Supplier;
pub use supplier::SupplierForm;
pub use supplier::SupplierSort;
pub use user::Entity as Users;
pub use user::Manager as UserMgr;
pub use user::Model as User;
pub use user::Role;
pub use user::UserForm;
pub use user::UserSort;
